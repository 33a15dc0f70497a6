pub mod auth;
mod sqlite_user_store;
mod user_manager;
pub mod user_models;
mod user_store;

pub use auth::{Claims, PasswordCredentials, PasswordHasherKind, TokenSigner, DEFAULT_TOKEN_TTL};
pub use sqlite_user_store::SqliteUserStore;
pub use user_manager::UserManager;
pub use user_models::{AuthPayload, LoginBody, RegisterBody, User, UserId, UserProfile};
pub use user_store::UserStore;
