use super::error::CatalogError;
use super::identity::Identity;
use crate::catalog_store::{Album, AlbumFilter, AlbumId, CatalogStore};
use std::sync::Arc;

const MAX_RELEASE_YEAR: i32 = 9999;

/// Read side of the catalog. Every result is annotated with the like state of
/// the requesting identity.
pub struct CatalogQueryService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogQueryService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub fn list_albums(
        &self,
        filter: &AlbumFilter,
        identity: Option<&Identity>,
    ) -> Result<Vec<Album>, CatalogError> {
        let filter = normalize_filter(filter)?;
        Ok(self
            .store
            .list_albums(&filter, identity.map(|i| i.user_id))?)
    }

    pub fn get_album(
        &self,
        id: AlbumId,
        identity: Option<&Identity>,
    ) -> Result<Option<Album>, CatalogError> {
        Ok(self.store.get_album(id, identity.map(|i| i.user_id))?)
    }
}

/// Blank strings mean "no filter". Years outside 0..=9999 are rejected.
fn normalize_filter(filter: &AlbumFilter) -> Result<AlbumFilter, CatalogError> {
    if let Some(year) = filter.release_year {
        if !(0..=MAX_RELEASE_YEAR).contains(&year) {
            return Err(CatalogError::Invalid(format!(
                "Invalid release year {}",
                year
            )));
        }
    }
    let non_blank = |s: &Option<String>| {
        s.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Ok(AlbumFilter {
        genre: non_blank(&filter.genre),
        artist: non_blank(&filter.artist),
        release_year: filter.release_year,
        liked_only: filter.liked_only,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::{seed_default_albums, SqliteCatalogStore};
    use crate::library::ErrorKind;
    use tempfile::TempDir;

    fn create_service() -> (CatalogQueryService, Arc<SqliteCatalogStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteCatalogStore::new(temp_dir.path().join("catalog.db")).unwrap());
        seed_default_albums(store.as_ref()).unwrap();
        (CatalogQueryService::new(store.clone()), store, temp_dir)
    }

    fn identity(user_id: i64) -> Identity {
        Identity {
            user_id,
            email: format!("{}@example.com", user_id),
        }
    }

    fn titles(albums: &[Album]) -> Vec<String> {
        albums.iter().map(|a| a.title.clone()).collect()
    }

    #[test]
    fn lists_everything_ordered_by_title() {
        let (service, _, _dir) = create_service();
        let albums = service.list_albums(&AlbumFilter::default(), None).unwrap();
        assert_eq!(
            titles(&albums),
            vec![
                "Abbey Road",
                "Back to Black",
                "Confessions",
                "Dark Side of the Moon",
                "Ready to Die",
                "Rumours",
                "Thriller"
            ]
        );
        assert!(albums.iter().all(|a| !a.is_liked));
    }

    #[test]
    fn liked_only_is_ignored_for_anonymous() {
        let (service, store, _dir) = create_service();
        let thriller = store
            .find_album_id("Thriller", "Michael Jackson")
            .unwrap()
            .unwrap();
        store.like_album(5, thriller).unwrap();

        let filters = [
            AlbumFilter::default(),
            AlbumFilter {
                genre: Some("Rock".to_string()),
                ..Default::default()
            },
            AlbumFilter {
                artist: Some("the".to_string()),
                ..Default::default()
            },
            AlbumFilter {
                release_year: Some(1982),
                ..Default::default()
            },
        ];
        for filter in filters {
            let liked_only = AlbumFilter {
                liked_only: true,
                ..filter.clone()
            };
            assert_eq!(
                service.list_albums(&liked_only, None).unwrap(),
                service.list_albums(&filter, None).unwrap()
            );
        }
    }

    #[test]
    fn liked_only_returns_exactly_the_liked_albums() {
        let (service, store, _dir) = create_service();
        for (title, artist) in [("Rumours", "Fleetwood Mac"), ("Abbey Road", "The Beatles")] {
            let id = store.find_album_id(title, artist).unwrap().unwrap();
            store.like_album(5, id).unwrap();
        }

        let albums = service
            .list_albums(&AlbumFilter::liked_only(), Some(&identity(5)))
            .unwrap();
        assert_eq!(titles(&albums), vec!["Abbey Road", "Rumours"]);
        assert!(albums.iter().all(|a| a.is_liked));

        let other = service
            .list_albums(&AlbumFilter::liked_only(), Some(&identity(6)))
            .unwrap();
        assert!(other.is_empty());
    }

    #[test]
    fn artist_filter_is_case_insensitive_substring() {
        let (service, _, _dir) = create_service();
        let filter = AlbumFilter {
            artist: Some("FLEETWOOD".to_string()),
            ..Default::default()
        };
        assert_eq!(
            titles(&service.list_albums(&filter, None).unwrap()),
            vec!["Rumours"]
        );
    }

    #[test]
    fn blank_filters_are_ignored() {
        let (service, _, _dir) = create_service();
        let filter = AlbumFilter {
            genre: Some("   ".to_string()),
            artist: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(service.list_albums(&filter, None).unwrap().len(), 7);
    }

    #[test]
    fn rejects_out_of_range_year() {
        let (service, _, _dir) = create_service();
        let filter = AlbumFilter {
            release_year: Some(-1),
            ..Default::default()
        };
        assert_eq!(
            service.list_albums(&filter, None).unwrap_err().kind(),
            ErrorKind::Invalid
        );
    }

    #[test]
    fn get_album_reports_like_state() {
        let (service, store, _dir) = create_service();
        let id = store
            .find_album_id("Abbey Road", "The Beatles")
            .unwrap()
            .unwrap();
        store.like_album(5, id).unwrap();

        assert!(service.get_album(id, Some(&identity(5))).unwrap().unwrap().is_liked);
        assert!(!service.get_album(id, None).unwrap().unwrap().is_liked);
        assert!(service.get_album(12345, None).unwrap().is_none());
    }
}
