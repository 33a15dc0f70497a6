//! The catalog operations as seen from a client.

use crate::catalog_store::{AddAlbumInput, Album, AlbumFilter, AlbumId, AlbumMetadata};
use crate::library::{ErrorBody, ErrorKind};
use crate::user::{AuthPayload, UserProfile};
use async_trait::async_trait;
use thiserror::Error;

/// A failed call, classified by kind. Transport and decoding failures are
/// reported as `ErrorKind::Internal`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.kind == ErrorKind::Unauthenticated
    }
}

impl From<ErrorBody> for ApiError {
    fn from(body: ErrorBody) -> Self {
        Self::new(body.kind, body.message)
    }
}

/// Every call takes the bearer token explicitly; there is no ambient
/// "logged in" state in the transport.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_albums(
        &self,
        token: Option<&str>,
        filter: &AlbumFilter,
    ) -> Result<Vec<Album>, ApiError>;

    /// Ok(None) when the album does not exist.
    async fn get_album(&self, token: Option<&str>, id: AlbumId) -> Result<Option<Album>, ApiError>;

    async fn like_album(&self, token: Option<&str>, id: AlbumId) -> Result<Album, ApiError>;

    async fn unlike_album(&self, token: Option<&str>, id: AlbumId) -> Result<Album, ApiError>;

    /// Ok(None) when the token does not resolve to a user.
    async fn me(&self, token: Option<&str>) -> Result<Option<UserProfile>, ApiError>;

    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ApiError>;

    async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<AuthPayload, ApiError>;

    /// Ok(None) when the metadata provider does not know the album.
    async fn lookup_album(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<AlbumMetadata>, ApiError>;

    async fn add_album(
        &self,
        token: Option<&str>,
        input: &AddAlbumInput,
    ) -> Result<Album, ApiError>;
}
