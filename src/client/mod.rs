//! Client side of the catalog: transport, credential and the optimistic cache.

mod api;
mod credentials;
mod http_api;
mod object_cache;
mod reconciler;

pub use api::{ApiError, CatalogApi};
pub use credentials::{CredentialEvent, CredentialStore, StoredCredential};
pub use http_api::HttpCatalogApi;
pub use object_cache::{CacheEntry, Listing, MutationId, ObjectCache};
pub use reconciler::{CacheReconciler, RefreshMode, ToggleOutcome};
