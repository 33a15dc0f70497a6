use super::auth::PasswordCredentials;
use super::user_models::{User, UserId};
use anyhow::Result;

pub trait UserStore: Send + Sync {
    /// Creates a new user and returns it.
    /// Returns Ok(None) if a user with this email already exists.
    fn create_user(&self, email: &str, name: Option<&str>) -> Result<Option<User>>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user(&self, user_id: UserId) -> Result<Option<User>>;

    /// Returns Ok(None) if no user has this email.
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Sets the display name. Returns false if the user does not exist.
    fn update_user_name(&self, user_id: UserId, name: Option<&str>) -> Result<bool>;

    /// Returns the user's password credentials, if any were set.
    fn get_password_credentials(&self, user_id: UserId) -> Result<Option<PasswordCredentials>>;

    /// Creates or replaces the user's password credentials.
    fn set_password_credentials(&self, credentials: &PasswordCredentials) -> Result<()>;

    fn get_users_count(&self) -> Result<usize>;
}
