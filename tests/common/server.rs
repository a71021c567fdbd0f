//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own catalog database.

use musicbox_server::catalog_store::SqliteCatalogStore;
use musicbox_server::server::server::make_app;
use musicbox_server::server::state::SharedCatalogStore;
use musicbox_server::server::{RequestsLoggingLevel, ServerConfig};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated database.
///
/// When dropped, the server shuts down and the temp database is cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl TestServer {
    /// Spawns a new test server on a random port with an empty catalog.
    pub async fn spawn() -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_db_dir.path().join("catalog.db");

        let store: SharedCatalogStore =
            Arc::new(SqliteCatalogStore::new(&db_path).expect("Failed to open catalog store"));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
        };
        let app = make_app(store, config);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Test server failed");
        });

        TestServer {
            base_url,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: shutdown_tx,
        }
    }
}
