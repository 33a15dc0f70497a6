//! Test fixtures: seeded stores and a canned metadata provider.

use super::constants::*;
use albumshelf_catalog_server::catalog_store::{
    seed_default_albums, AlbumMetadata, CatalogStore, NewTrack, SqliteCatalogStore,
};
use albumshelf_catalog_server::library::CatalogError;
use albumshelf_catalog_server::metadata::MetadataProvider;
use albumshelf_catalog_server::user::{PasswordCredentials, SqliteUserStore, UserStore};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestStores {
    pub dir: TempDir,
    pub catalog_store: Arc<SqliteCatalogStore>,
    pub user_store: Arc<SqliteUserStore>,
}

/// Creates catalog and user databases in a temp dir, seeds the default
/// albums and the two test users. The test user likes Abbey Road.
pub fn create_test_stores() -> Result<TestStores> {
    let dir = TempDir::new()?;
    let catalog_store = Arc::new(SqliteCatalogStore::new(dir.path().join("catalog.db"))?);
    let user_store = Arc::new(SqliteUserStore::new(dir.path().join("user.db"))?);

    if seed_default_albums(catalog_store.as_ref())? != SEEDED_ALBUMS_COUNT {
        bail!("Unexpected seeded albums count");
    }
    if catalog_store.find_album_id("Abbey Road", "The Beatles")? != Some(ABBEY_ROAD_ID) {
        bail!("Seeded album ids do not match the test constants");
    }

    for (email, name, password) in [
        (TEST_USER_EMAIL, Some(TEST_USER_NAME), TEST_PASS),
        (OTHER_USER_EMAIL, None, OTHER_PASS),
    ] {
        let user = user_store
            .create_user(email, name)?
            .with_context(|| format!("User {} already exists", email))?;
        user_store.set_password_credentials(&PasswordCredentials::create(user.id, password)?)?;
    }

    let test_user = user_store
        .get_user_by_email(TEST_USER_EMAIL)?
        .context("Test user missing")?;
    catalog_store.like_album(test_user.id, ABBEY_ROAD_ID)?;

    Ok(TestStores {
        dir,
        catalog_store,
        user_store,
    })
}

/// Knows exactly one album.
pub struct FakeMetadataProvider;

#[async_trait]
impl MetadataProvider for FakeMetadataProvider {
    async fn lookup_album(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<AlbumMetadata>, CatalogError> {
        if !artist.eq_ignore_ascii_case(LOOKUP_ARTIST) || !title.eq_ignore_ascii_case(LOOKUP_TITLE)
        {
            return Ok(None);
        }
        let tracks = ["Airbag", "Paranoid Android", "Subterranean Homesick Alien"]
            .iter()
            .map(|name| NewTrack {
                name: name.to_string(),
                artist: LOOKUP_ARTIST.to_string(),
                duration: Some(300),
                url: None,
            })
            .collect::<Vec<_>>();
        assert_eq!(tracks.len(), LOOKUP_TRACKS_COUNT);
        Ok(Some(AlbumMetadata {
            album_cover: Some("https://img.example.com/ok-computer-medium.png".to_string()),
            large_album_cover: Some("https://img.example.com/ok-computer-large.png".to_string()),
            album_url: Some("https://www.last.fm/music/Radiohead/OK+Computer".to_string()),
            tracks,
        }))
    }
}
