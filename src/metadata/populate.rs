use super::MetadataProvider;
use crate::catalog_store::{AlbumFilter, CatalogStore};
use crate::library::CatalogEditor;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Pause between two lookups.
pub const POPULATE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PopulateReport {
    pub updated: usize,
    pub not_found: usize,
    pub failed: usize,
}

/// Refreshes covers, links and tracks of every album in the catalog from the
/// metadata provider. A failing album is logged and skipped.
pub async fn populate_catalog(
    store: Arc<dyn CatalogStore>,
    provider: &dyn MetadataProvider,
    delay: Duration,
) -> Result<PopulateReport> {
    let albums = store.list_albums(&AlbumFilter::default(), None)?;
    let editor = CatalogEditor::new(store);
    let mut report = PopulateReport::default();
    info!("Populating metadata of {} albums", albums.len());

    for (index, album) in albums.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match provider.lookup_album(&album.artist, &album.title).await {
            Ok(Some(metadata)) => match editor.apply_metadata(album.id, &metadata) {
                Ok(updated) => {
                    info!(
                        "Updated \"{}\" by {} ({} tracks)",
                        updated.title,
                        updated.artist,
                        updated.tracks.len()
                    );
                    report.updated += 1;
                }
                Err(err) => {
                    warn!("Could not update \"{}\": {}", album.title, err);
                    report.failed += 1;
                }
            },
            Ok(None) => {
                warn!("No metadata found for \"{}\" by {}", album.title, album.artist);
                report.not_found += 1;
            }
            Err(err) => {
                warn!("Lookup of \"{}\" failed: {}", album.title, err);
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::{seed_default_albums, AlbumMetadata, NewTrack, SqliteCatalogStore};
    use crate::library::CatalogError;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct FakeProvider;

    #[async_trait]
    impl MetadataProvider for FakeProvider {
        async fn lookup_album(
            &self,
            artist: &str,
            title: &str,
        ) -> Result<Option<AlbumMetadata>, CatalogError> {
            match title {
                "Thriller" => Err(CatalogError::Upstream("down".to_string())),
                "Confessions" => Ok(None),
                _ => Ok(Some(AlbumMetadata {
                    album_cover: Some(format!("{}.png", title)),
                    large_album_cover: None,
                    album_url: None,
                    tracks: vec![NewTrack {
                        name: format!("{} intro", title),
                        artist: artist.to_string(),
                        duration: Some(60),
                        url: None,
                    }],
                })),
            }
        }
    }

    #[tokio::test]
    async fn populates_and_skips_failures() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteCatalogStore::new(temp_dir.path().join("catalog.db")).unwrap());
        seed_default_albums(store.as_ref()).unwrap();

        let report = populate_catalog(store.clone(), &FakeProvider, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(
            report,
            PopulateReport {
                updated: 5,
                not_found: 1,
                failed: 1
            }
        );

        let rumours_id = store
            .find_album_id("Rumours", "Fleetwood Mac")
            .unwrap()
            .unwrap();
        let rumours = store.get_album(rumours_id, None).unwrap().unwrap();
        assert_eq!(rumours.album_cover.as_deref(), Some("Rumours.png"));
        assert_eq!(rumours.tracks.len(), 1);

        // Running again replaces tracks instead of appending.
        populate_catalog(store.clone(), &FakeProvider, Duration::ZERO)
            .await
            .unwrap();
        let rumours = store.get_album(rumours_id, None).unwrap().unwrap();
        assert_eq!(rumours.tracks.len(), 1);
    }
}
