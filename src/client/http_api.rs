//! `CatalogApi` over the HTTP surface of the catalog server.

use super::api::{ApiError, CatalogApi};
use crate::catalog_store::{AddAlbumInput, Album, AlbumFilter, AlbumId, AlbumMetadata};
use crate::library::{ErrorBody, ErrorKind};
use crate::user::{AuthPayload, LoginBody, RegisterBody, UserProfile};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub struct HttpCatalogApi {
    client: Client,
    base_url: String,
}

impl HttpCatalogApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
        builder.send().await.map_err(|e| {
            debug!("Request failed: {}", e);
            ApiError::internal(format!("Could not reach the catalog server: {}", e))
        })
    }

    /// Decodes a success body, or classifies the failure by the error body's
    /// kind, falling back to the status code.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ApiError::internal(format!("Invalid response body: {}", e)));
        }
        let bytes = response.bytes().await.unwrap_or_default();
        match serde_json::from_slice::<ErrorBody>(&bytes) {
            Ok(body) => Err(body.into()),
            Err(_) => Err(ApiError::new(
                ErrorKind::from_status(status),
                format!("Request failed with status {}", status),
            )),
        }
    }

    /// Like `decode`, mapping 404 to Ok(None).
    async fn decode_optional<T: DeserializeOwned>(
        response: Response,
    ) -> Result<Option<T>, ApiError> {
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(response).await.map(Some)
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn list_albums(
        &self,
        token: Option<&str>,
        filter: &AlbumFilter,
    ) -> Result<Vec<Album>, ApiError> {
        let response = Self::send(self.request(Method::GET, "/v1/albums", token).query(filter)).await?;
        Self::decode(response).await
    }

    async fn get_album(&self, token: Option<&str>, id: AlbumId) -> Result<Option<Album>, ApiError> {
        let path = format!("/v1/albums/{}", id);
        let response = Self::send(self.request(Method::GET, &path, token)).await?;
        Self::decode_optional(response).await
    }

    async fn like_album(&self, token: Option<&str>, id: AlbumId) -> Result<Album, ApiError> {
        let path = format!("/v1/user/liked/{}", id);
        let response = Self::send(self.request(Method::POST, &path, token)).await?;
        Self::decode(response).await
    }

    async fn unlike_album(&self, token: Option<&str>, id: AlbumId) -> Result<Album, ApiError> {
        let path = format!("/v1/user/liked/{}", id);
        let response = Self::send(self.request(Method::DELETE, &path, token)).await?;
        Self::decode(response).await
    }

    async fn me(&self, token: Option<&str>) -> Result<Option<UserProfile>, ApiError> {
        let response = Self::send(self.request(Method::GET, "/v1/user/me", token)).await?;
        Self::decode(response).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ApiError> {
        let body = LoginBody {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response =
            Self::send(self.request(Method::POST, "/v1/auth/login", None).json(&body)).await?;
        Self::decode(response).await
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<AuthPayload, ApiError> {
        let body = RegisterBody {
            email: email.to_string(),
            password: password.to_string(),
            name: name.map(str::to_string),
        };
        let response =
            Self::send(self.request(Method::POST, "/v1/auth/register", None).json(&body)).await?;
        Self::decode(response).await
    }

    async fn lookup_album(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<AlbumMetadata>, ApiError> {
        let response = Self::send(
            self.request(Method::GET, "/v1/metadata/album", None)
                .query(&[("artist", artist), ("title", title)]),
        )
        .await?;
        Self::decode_optional(response).await
    }

    async fn add_album(
        &self,
        token: Option<&str>,
        input: &AddAlbumInput,
    ) -> Result<Album, ApiError> {
        let response =
            Self::send(self.request(Method::POST, "/v1/albums", token).json(input)).await?;
        Self::decode(response).await
    }
}
