use super::error::CatalogError;
use crate::catalog_store::{AddAlbumInput, Album, AlbumId, AlbumMetadata, CatalogStore, NewAlbum};
use chrono::Datelike;
use std::sync::Arc;

pub const DEFAULT_GENRE: &str = "Unknown";

/// Write side of the catalog: album creation and metadata refresh.
pub struct CatalogEditor {
    store: Arc<dyn CatalogStore>,
}

impl CatalogEditor {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Adds the album unless one with the same title and artist exists, in which
    /// case the existing album is returned untouched. The flag tells whether a
    /// new album was created.
    pub fn add_album(&self, input: AddAlbumInput) -> Result<(Album, bool), CatalogError> {
        let new_album = apply_defaults(input)?;
        let (album_id, created) = self.store.add_album(new_album)?;
        let album = self
            .store
            .get_album(album_id, None)?
            .ok_or_else(|| CatalogError::album_not_found(album_id))?;
        Ok((album, created))
    }

    pub fn apply_metadata(
        &self,
        album_id: AlbumId,
        metadata: &AlbumMetadata,
    ) -> Result<Album, CatalogError> {
        if self.store.get_album(album_id, None)?.is_none() {
            return Err(CatalogError::album_not_found(album_id));
        }
        self.store.replace_album_metadata(album_id, metadata)?;
        self.store
            .get_album(album_id, None)?
            .ok_or_else(|| CatalogError::album_not_found(album_id))
    }
}

fn apply_defaults(input: AddAlbumInput) -> Result<NewAlbum, CatalogError> {
    let title = input.title.trim().to_string();
    let artist = input.artist.trim().to_string();
    if title.is_empty() || artist.is_empty() {
        return Err(CatalogError::Invalid(
            "Album title and artist are required".to_string(),
        ));
    }
    let genre = input
        .genre
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| DEFAULT_GENRE.to_string());

    Ok(NewAlbum {
        title,
        artist,
        genre,
        release_year: input
            .release_year
            .unwrap_or_else(|| chrono::Utc::now().year()),
        album_cover: input.album_cover.unwrap_or_default(),
        large_album_cover: input.large_album_cover.unwrap_or_default(),
        album_url: input.album_url.unwrap_or_default(),
        tracks: input.tracks,
    })
}
