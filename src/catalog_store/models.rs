//! Catalog data models, shared by the server and the client cache.

use serde::{Deserialize, Serialize};

pub type AlbumId = i64;
pub type TrackId = i64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub artist: String,
    /// Duration in seconds, when the metadata provider knows it.
    pub duration: Option<i64>,
    pub url: Option<String>,
    pub album_id: AlbumId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub release_year: i32,
    pub album_cover: Option<String>,
    pub large_album_cover: Option<String>,
    pub album_url: Option<String>,
    /// Unix timestamps (seconds).
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub tracks: Vec<Track>,
    /// Whether the requesting identity liked this album. Always false for
    /// anonymous requests.
    #[serde(default)]
    pub is_liked: bool,
}

impl Album {
    pub fn with_liked(mut self, is_liked: bool) -> Self {
        self.is_liked = is_liked;
        self
    }
}

/// Listing filter. Every present field narrows the result set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// Case-insensitive substring match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    /// Only effective for authenticated requests.
    #[serde(default)]
    pub liked_only: bool,
}

impl AlbumFilter {
    pub fn liked_only() -> Self {
        AlbumFilter {
            liked_only: true,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrack {
    pub name: String,
    pub artist: String,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Album creation request as received on the wire. Optional fields get
/// defaulted before reaching the store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAlbumInput {
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_album_cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub tracks: Vec<NewTrack>,
}

/// A fully defaulted album, ready to be inserted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAlbum {
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub release_year: i32,
    pub album_cover: String,
    pub large_album_cover: String,
    pub album_url: String,
    pub tracks: Vec<NewTrack>,
}

/// Media references and track list obtained from the metadata provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumMetadata {
    pub album_cover: Option<String>,
    pub large_album_cover: Option<String>,
    pub album_url: Option<String>,
    pub tracks: Vec<NewTrack>,
}

impl AlbumMetadata {
    /// Builds the creation input for `artist`/`title` out of the looked up metadata.
    pub fn into_add_album_input(self, artist: &str, title: &str) -> AddAlbumInput {
        AddAlbumInput {
            title: title.to_string(),
            artist: artist.to_string(),
            album_cover: self.album_cover,
            large_album_cover: self.large_album_cover,
            album_url: self.album_url,
            genre: None,
            release_year: None,
            tracks: self.tracks,
        }
    }
}
