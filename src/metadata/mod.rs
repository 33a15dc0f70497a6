//! External album metadata: covers, links and track lists.

mod lastfm;
mod populate;

pub use lastfm::{parse_album_info, LastFmClient, LASTFM_API_BASE};
pub use populate::{populate_catalog, PopulateReport, POPULATE_DELAY};

use crate::catalog_store::AlbumMetadata;
use crate::library::CatalogError;
use async_trait::async_trait;

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Looks up an album. Ok(None) means the provider does not know it,
    /// `CatalogError::Upstream` means the provider could not be queried.
    async fn lookup_album(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<AlbumMetadata>, CatalogError>;
}
