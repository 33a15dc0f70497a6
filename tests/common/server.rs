//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own databases. When dropped,
//! the server shuts down and the temp dir is removed.

use super::constants::*;
use super::fixtures::{create_test_stores, FakeMetadataProvider};
use albumshelf_catalog_server::catalog_store::CatalogStore;
use albumshelf_catalog_server::metadata::MetadataProvider;
use albumshelf_catalog_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use albumshelf_catalog_server::user::{TokenSigner, UserId, UserStore, DEFAULT_TOKEN_TTL};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub struct TestServer {
    /// e.g. "http://127.0.0.1:12345"
    pub base_url: String,
    pub port: u16,

    /// Direct store access for assertions
    pub catalog_store: Arc<dyn CatalogStore>,
    pub user_store: Arc<dyn UserStore>,
    pub test_user_id: UserId,

    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server without a metadata provider.
    pub async fn spawn() -> Self {
        Self::spawn_with_metadata(None).await
    }

    /// Spawns a server whose metadata lookups are answered by
    /// `FakeMetadataProvider`.
    pub async fn spawn_with_fake_metadata() -> Self {
        Self::spawn_with_metadata(Some(Arc::new(FakeMetadataProvider))).await
    }

    /// # Panics
    ///
    /// Panics if the fixtures cannot be created, the port cannot be bound or
    /// the server does not become ready in time.
    pub async fn spawn_with_metadata(metadata_provider: Option<Arc<dyn MetadataProvider>>) -> Self {
        let stores = create_test_stores().expect("Failed to create test stores");
        let catalog_store: Arc<dyn CatalogStore> = stores.catalog_store;
        let user_store: Arc<dyn UserStore> = stores.user_store;
        let test_user_id = user_store
            .get_user_by_email(TEST_USER_EMAIL)
            .expect("Failed to read test user")
            .expect("Test user missing")
            .id;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
        };
        let token_signer = TokenSigner::with_random_secret(DEFAULT_TOKEN_TTL);

        let app = make_app(
            config,
            catalog_store.clone(),
            user_store.clone(),
            token_signer,
            metadata_provider,
        )
        .expect("Failed to build app");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            catalog_store,
            user_store,
            test_user_id,
            _temp_dir: stores.dir,
            _shutdown_tx: Some(shutdown_tx),
        };
        server.wait_for_ready().await;
        server
    }

    /// Polls `/` until the server answers.
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);
        while start.elapsed() < timeout {
            if let Ok(response) = client.get(format!("{}/", self.base_url)).send().await {
                if response.status().is_success() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
        }
        panic!("Server did not become ready within {:?}", timeout);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
