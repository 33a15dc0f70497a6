//! Server-side catalog services: identity resolution, filtered queries, like
//! toggling and catalog editing.

mod catalog_editor;
mod catalog_query;
mod error;
mod identity;
mod like_toggle;

pub use catalog_editor::{CatalogEditor, DEFAULT_GENRE};
pub use catalog_query::CatalogQueryService;
pub use error::{CatalogError, ErrorBody, ErrorKind};
pub use identity::{resolve_identity, Identity, COOKIE_SESSION_TOKEN_KEY};
pub use like_toggle::LikeToggleService;
