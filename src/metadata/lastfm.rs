//! Last.fm client for album metadata (`album.getinfo`).
//!
//! Requests are spaced by at least 200 ms, following Last.fm API guidelines.

use super::MetadataProvider;
use crate::catalog_store::{AlbumMetadata, NewTrack};
use crate::library::CatalogError;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub const LASTFM_API_BASE: &str = "https://ws.audioscrobbler.com/2.0/";
const RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(200);

pub struct LastFmClient {
    client: Client,
    api_key: String,
    base_url: String,
    last_request: Mutex<Instant>,
}

#[derive(Deserialize)]
struct AlbumInfoResponse {
    album: Option<LastFmAlbum>,
    error: Option<i64>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct LastFmAlbum {
    url: Option<String>,
    #[serde(default)]
    image: Vec<LastFmImage>,
    tracks: Option<LastFmTracks>,
}

#[derive(Deserialize)]
struct LastFmImage {
    #[serde(rename = "#text")]
    text: String,
    size: String,
}

#[derive(Deserialize)]
struct LastFmTracks {
    track: Option<OneOrMany<LastFmTrack>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Number(i64),
    Float(f64),
    String(String),
}

#[derive(Deserialize)]
struct LastFmTrack {
    #[serde(default)]
    name: String,
    duration: Option<StringOrNumber>,
    url: Option<String>,
    artist: Option<LastFmTrackArtist>,
}

#[derive(Deserialize)]
struct LastFmTrackArtist {
    name: Option<String>,
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.filter(|s| !s.is_empty()).map(str::to_string)
}

fn parse_duration(duration: Option<StringOrNumber>) -> Option<i64> {
    match duration? {
        StringOrNumber::Number(n) => Some(n),
        StringOrNumber::Float(f) => Some(f as i64),
        StringOrNumber::String(s) => s.trim().parse().ok(),
    }
}

/// Turns an `album.getinfo` JSON body into album metadata. Returns Ok(None) when
/// Last.fm reports an error or knows no such album.
pub fn parse_album_info(body: &str, artist: &str) -> Result<Option<AlbumMetadata>> {
    let response: AlbumInfoResponse = serde_json::from_str(body)?;
    if let Some(code) = response.error {
        debug!(
            "Last.fm error {}: {}",
            code,
            response.message.unwrap_or_default()
        );
        return Ok(None);
    }
    let Some(album) = response.album else {
        return Ok(None);
    };

    let image_of = |sizes: &[&str]| {
        album
            .image
            .iter()
            .find(|img| sizes.contains(&img.size.as_str()))
            .and_then(|img| non_empty(Some(img.text.as_str())))
    };
    let album_cover = image_of(&["medium"]);
    let large_album_cover = image_of(&["large", "extralarge"]);

    let tracks = album
        .tracks
        .and_then(|t| t.track)
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .map(|track| NewTrack {
            name: track.name,
            artist: track
                .artist
                .and_then(|a| non_empty(a.name.as_deref()))
                .unwrap_or_else(|| artist.to_string()),
            duration: parse_duration(track.duration),
            url: non_empty(track.url.as_deref()),
        })
        .collect();

    Ok(Some(AlbumMetadata {
        album_cover,
        large_album_cover,
        album_url: non_empty(album.url.as_deref()),
        tracks,
    }))
}

impl LastFmClient {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, LASTFM_API_BASE)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
            last_request: Mutex::new(Instant::now() - RATE_LIMIT_INTERVAL),
        })
    }

    async fn rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < RATE_LIMIT_INTERVAL {
            tokio::time::sleep(RATE_LIMIT_INTERVAL - elapsed).await;
        }
        *last = Instant::now();
    }
}

#[async_trait]
impl MetadataProvider for LastFmClient {
    async fn lookup_album(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<AlbumMetadata>, CatalogError> {
        self.rate_limit().await;

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("method", "album.getinfo"),
                ("artist", artist),
                ("album", title),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!("Last.fm request failed: {}", e);
                CatalogError::Upstream("Album metadata lookup is unavailable".to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            CatalogError::Upstream(format!("Could not read Last.fm response: {}", e))
        })?;
        // Last.fm answers unknown albums with an error payload, sometimes with a 4xx.
        if !status.is_success() && !body.trim_start().starts_with('{') {
            warn!("Last.fm answered with status {}", status);
            return Err(CatalogError::Upstream(format!(
                "Album metadata lookup failed with status {}",
                status
            )));
        }

        parse_album_info(&body, artist).map_err(|e| {
            warn!("Could not decode Last.fm response: {}", e);
            CatalogError::Upstream("Album metadata lookup returned an invalid response".to_string())
        })
    }
}
