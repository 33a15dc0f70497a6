//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per endpoint. When routes or request
//! formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// Test client with cookie-based session management
pub struct TestClient {
    pub client: reqwest::Client,
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// A client logged in as the test user.
    ///
    /// # Panics
    ///
    /// Panics if the login fails.
    pub async fn authenticated(base_url: String) -> Self {
        Self::authenticated_as(base_url, TEST_USER_EMAIL, TEST_PASS).await
    }

    pub async fn authenticated_as(base_url: String, email: &str, password: &str) -> Self {
        let client = Self::new(base_url);
        let response = client.login(email, password).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Authentication of {} failed: {:?}",
            email,
            response.text().await
        );
        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/register
    pub async fn register(&self, email: &str, password: &str, name: Option<&str>) -> Response {
        self.client
            .post(self.url("/v1/auth/register"))
            .json(&json!({ "email": email, "password": password, "name": name }))
            .send()
            .await
            .expect("Register request failed")
    }

    /// POST /v1/auth/login
    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// GET /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.client
            .get(self.url("/v1/auth/logout"))
            .send()
            .await
            .expect("Logout request failed")
    }

    // ========================================================================
    // User Endpoints
    // ========================================================================

    /// GET /v1/user/me
    pub async fn me(&self) -> Response {
        self.client
            .get(self.url("/v1/user/me"))
            .send()
            .await
            .expect("Me request failed")
    }

    /// GET /v1/user/me with an explicit bearer token
    pub async fn me_with_token(&self, token: &str) -> Response {
        self.client
            .get(self.url("/v1/user/me"))
            .bearer_auth(token)
            .send()
            .await
            .expect("Me request failed")
    }

    /// PUT /v1/user/me
    pub async fn update_name(&self, name: Option<&str>) -> Response {
        self.client
            .put(self.url("/v1/user/me"))
            .json(&json!({ "name": name }))
            .send()
            .await
            .expect("Update name request failed")
    }

    /// GET /v1/user/liked
    pub async fn get_liked_albums(&self) -> Response {
        self.client
            .get(self.url("/v1/user/liked"))
            .send()
            .await
            .expect("Liked albums request failed")
    }

    /// POST /v1/user/liked/{id}
    pub async fn like_album(&self, id: i64) -> Response {
        self.client
            .post(self.url(&format!("/v1/user/liked/{}", id)))
            .send()
            .await
            .expect("Like request failed")
    }

    /// DELETE /v1/user/liked/{id}
    pub async fn unlike_album(&self, id: i64) -> Response {
        self.client
            .delete(self.url(&format!("/v1/user/liked/{}", id)))
            .send()
            .await
            .expect("Unlike request failed")
    }

    // ========================================================================
    // Catalog Endpoints
    // ========================================================================

    /// GET /v1/albums?{query}
    pub async fn list_albums(&self, query: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url("/v1/albums"))
            .query(query)
            .send()
            .await
            .expect("List albums request failed")
    }

    /// GET /v1/albums/{id}
    pub async fn get_album(&self, id: i64) -> Response {
        self.client
            .get(self.url(&format!("/v1/albums/{}", id)))
            .send()
            .await
            .expect("Get album request failed")
    }

    /// POST /v1/albums
    pub async fn add_album(&self, body: &Value) -> Response {
        self.client
            .post(self.url("/v1/albums"))
            .json(body)
            .send()
            .await
            .expect("Add album request failed")
    }

    /// GET /v1/metadata/album?artist=&title=
    pub async fn lookup_album(&self, artist: &str, title: &str) -> Response {
        self.client
            .get(self.url("/v1/metadata/album"))
            .query(&[("artist", artist), ("title", title)])
            .send()
            .await
            .expect("Metadata lookup request failed")
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Titles of the albums listed with `query`, in response order.
    pub async fn list_titles(&self, query: &[(&str, &str)]) -> Vec<String> {
        let response = self.list_albums(query).await;
        assert!(response.status().is_success(), "{:?}", response.status());
        let albums: Vec<Value> = response.json().await.expect("Invalid albums body");
        albums
            .iter()
            .map(|a| a["title"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}
