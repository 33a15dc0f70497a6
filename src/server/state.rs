use axum::extract::FromRef;

use crate::library::{CatalogEditor, CatalogQueryService, LikeToggleService};
use crate::metadata::MetadataProvider;
use crate::user::UserManager;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedCatalogQuery = Arc<CatalogQueryService>;
pub type GuardedLikeToggle = Arc<LikeToggleService>;
pub type GuardedCatalogEditor = Arc<CatalogEditor>;
pub type GuardedUserManager = Arc<UserManager>;
pub type OptionalMetadataProvider = Option<Arc<dyn MetadataProvider>>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub catalog_query: GuardedCatalogQuery,
    pub like_toggle: GuardedLikeToggle,
    pub catalog_editor: GuardedCatalogEditor,
    pub user_manager: GuardedUserManager,
    pub metadata_provider: OptionalMetadataProvider,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedCatalogQuery {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog_query.clone()
    }
}

impl FromRef<ServerState> for GuardedLikeToggle {
    fn from_ref(input: &ServerState) -> Self {
        input.like_toggle.clone()
    }
}

impl FromRef<ServerState> for GuardedCatalogEditor {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog_editor.clone()
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for OptionalMetadataProvider {
    fn from_ref(input: &ServerState) -> Self {
        input.metadata_provider.clone()
    }
}
