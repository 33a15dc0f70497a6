use super::auth::{PasswordCredentials, TokenSigner};
use super::user_models::{AuthPayload, User, UserProfile};
use super::user_store::UserStore;
use crate::catalog_store::CatalogStore;
use crate::library::{CatalogError, Identity};
use std::sync::Arc;
use tracing::{debug, info};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub struct UserManager {
    catalog_store: Arc<dyn CatalogStore>,
    user_store: Arc<dyn UserStore>,
    token_signer: TokenSigner,
}

impl UserManager {
    pub fn new(
        catalog_store: Arc<dyn CatalogStore>,
        user_store: Arc<dyn UserStore>,
        token_signer: TokenSigner,
    ) -> Self {
        Self {
            catalog_store,
            user_store,
            token_signer,
        }
    }

    pub fn token_signer(&self) -> &TokenSigner {
        &self.token_signer
    }

    pub fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<AuthPayload, CatalogError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(CatalogError::Invalid("The email cannot be empty".to_string()));
        }
        if password.is_empty() {
            return Err(CatalogError::Invalid(
                "The password cannot be empty".to_string(),
            ));
        }
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        if self.user_store.get_user_by_email(email)?.is_some() {
            return Err(CatalogError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }
        let user = self.user_store.create_user(email, name)?.ok_or_else(|| {
            CatalogError::Conflict("User with this email already exists".to_string())
        })?;
        let credentials = PasswordCredentials::create(user.id, password)?;
        self.user_store.set_password_credentials(&credentials)?;
        info!("Registered user {} ({})", user.id, user.email);

        self.auth_payload(user)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<AuthPayload, CatalogError> {
        let user = match self.user_store.get_user_by_email(email.trim())? {
            Some(user) => user,
            None => {
                debug!("Login attempt for unknown email");
                return Err(CatalogError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
            }
        };
        let credentials = self.user_store.get_password_credentials(user.id)?;
        let password_ok = match credentials {
            Some(credentials) => credentials.matches(password)?,
            None => false,
        };
        if !password_ok {
            debug!("Wrong password for user {}", user.id);
            return Err(CatalogError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        }
        self.auth_payload(user)
    }

    fn auth_payload(&self, user: User) -> Result<AuthPayload, CatalogError> {
        let token = self.token_signer.sign(&user)?;
        Ok(AuthPayload { token, user })
    }

    /// The profile of the identity's user, or None when anonymous or when the
    /// user no longer exists.
    pub fn me(&self, identity: Option<&Identity>) -> Result<Option<UserProfile>, CatalogError> {
        let Some(identity) = identity else {
            return Ok(None);
        };
        let Some(user) = self.user_store.get_user(identity.user_id)? else {
            return Ok(None);
        };
        let liked_albums = self.catalog_store.get_liked_albums(user.id)?;
        Ok(Some(UserProfile { user, liked_albums }))
    }

    pub fn update_user_name(
        &self,
        identity: Option<&Identity>,
        name: Option<&str>,
    ) -> Result<User, CatalogError> {
        let identity = identity.ok_or_else(CatalogError::not_authenticated)?;
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        if !self.user_store.update_user_name(identity.user_id, name)? {
            return Err(CatalogError::NotFound(format!(
                "User {} not found",
                identity.user_id
            )));
        }
        self.user_store
            .get_user(identity.user_id)?
            .ok_or_else(|| CatalogError::NotFound(format!("User {} not found", identity.user_id)))
    }
}
