//! CatalogStore trait definition.

use super::models::{Album, AlbumFilter, AlbumId, AlbumMetadata, NewAlbum};
use crate::user::UserId;
use anyhow::Result;

/// Trait for catalog storage backends.
///
/// Every read takes the requesting user (if any) so that `Album::is_liked`
/// is computed by the store in the same query that loads the album.
pub trait CatalogStore: Send + Sync {
    /// Returns the albums matching `filter`, ordered by title ascending.
    /// `filter.liked_only` is applied only when `user_id` is present.
    fn list_albums(&self, filter: &AlbumFilter, user_id: Option<UserId>) -> Result<Vec<Album>>;

    /// Returns the album with the given id, or Ok(None) if it does not exist.
    fn get_album(&self, id: AlbumId, user_id: Option<UserId>) -> Result<Option<Album>>;

    /// Returns the id of the album with exactly this title and artist.
    fn find_album_id(&self, title: &str, artist: &str) -> Result<Option<AlbumId>>;

    /// Inserts an album with its tracks unless an album with the same title and
    /// artist exists. Returns the album id and whether it was created.
    fn add_album(&self, album: NewAlbum) -> Result<(AlbumId, bool)>;

    /// Replaces covers, url and tracks of an existing album.
    fn replace_album_metadata(&self, id: AlbumId, metadata: &AlbumMetadata) -> Result<()>;

    /// Records that the user likes the album. Returns true if a new relation
    /// row was created, false if it already existed.
    fn like_album(&self, user_id: UserId, album_id: AlbumId) -> Result<bool>;

    /// Removes the like relation. Returns true if a row was removed.
    fn unlike_album(&self, user_id: UserId, album_id: AlbumId) -> Result<bool>;

    /// Returns the number of relation rows for the pair (0 or 1).
    fn count_likes(&self, user_id: UserId, album_id: AlbumId) -> Result<usize>;

    /// Returns all albums liked by the user, ordered by title.
    fn get_liked_albums(&self, user_id: UserId) -> Result<Vec<Album>>;

    /// Returns the number of albums in the catalog.
    fn get_albums_count(&self) -> Result<usize>;
}
