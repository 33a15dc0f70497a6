use super::error::CatalogError;
use super::identity::Identity;
use crate::catalog_store::{Album, AlbumFilter, AlbumId, CatalogStore};
use std::sync::Arc;
use tracing::debug;

/// Creates and removes like relations. Both directions are idempotent and
/// always answer with the album as currently stored.
pub struct LikeToggleService {
    store: Arc<dyn CatalogStore>,
}

impl LikeToggleService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub fn like(&self, album_id: AlbumId, identity: Option<&Identity>) -> Result<Album, CatalogError> {
        self.toggle(album_id, identity, true)
    }

    pub fn unlike(
        &self,
        album_id: AlbumId,
        identity: Option<&Identity>,
    ) -> Result<Album, CatalogError> {
        self.toggle(album_id, identity, false)
    }

    fn toggle(
        &self,
        album_id: AlbumId,
        identity: Option<&Identity>,
        liked: bool,
    ) -> Result<Album, CatalogError> {
        let identity = identity.ok_or_else(CatalogError::not_authenticated)?;
        if self.store.get_album(album_id, Some(identity.user_id))?.is_none() {
            return Err(CatalogError::album_not_found(album_id));
        }

        let changed = if liked {
            self.store.like_album(identity.user_id, album_id)?
        } else {
            self.store.unlike_album(identity.user_id, album_id)?
        };
        debug!(
            "User {} {} album {} (changed: {})",
            identity.user_id,
            if liked { "liked" } else { "unliked" },
            album_id,
            changed
        );

        // Re-read so that is_liked reflects the store, not the request.
        self.store
            .get_album(album_id, Some(identity.user_id))?
            .ok_or_else(|| CatalogError::album_not_found(album_id))
    }

    pub fn liked_albums(&self, identity: Option<&Identity>) -> Result<Vec<Album>, CatalogError> {
        let identity = identity.ok_or_else(CatalogError::not_authenticated)?;
        Ok(self
            .store
            .list_albums(&AlbumFilter::liked_only(), Some(identity.user_id))?)
    }
}
