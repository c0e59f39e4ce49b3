//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a temp upload
//! directory, and a full `AppContext`. The [`TestHarness::with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use stockroom_core::config::Config;
use stockroom_db::pool::{get_conn, init_memory_pool, DbPool, PooledConnection};
use stockroom_server::context::AppContext;
use stockroom_server::router::build_router;
use stockroom_server::uploads::UploadStore;

/// Test harness wrapping a fully-constructed `AppContext` backed by an
/// in-memory database and a temporary upload directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    upload_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration, in-memory DB, and a
    /// fresh temp dir as the blob store root.
    pub fn new() -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let upload_dir = tempfile::tempdir().expect("failed to create upload tempdir");

        let mut config = Config::default();
        config.storage.upload_dir = upload_dir.path().to_path_buf();

        let uploads = Arc::new(UploadStore::new(
            upload_dir.path().to_path_buf(),
            config.storage.max_file_size_bytes,
        ));

        let ctx = AppContext {
            db: db.clone(),
            config: Arc::new(config),
            uploads,
        };

        Self {
            ctx,
            db,
            upload_dir,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new();
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// The blob store root on disk.
    pub fn upload_root(&self) -> &Path {
        self.upload_dir.path()
    }

    /// Grab a pooled DB connection.
    pub fn conn(&self) -> PooledConnection {
        get_conn(&self.db).expect("failed to get pooled connection")
    }

    /// Number of files currently present in the blob store.
    pub fn stored_file_count(&self) -> usize {
        std::fs::read_dir(self.upload_root())
            .expect("failed to read upload dir")
            .count()
    }
}

/// A multipart file part with valid JPEG extension and content-type.
///
/// Upload intake validates the extension and declared type only, so the
/// bytes do not need to decode as an actual image.
pub fn jpeg_part(file_name: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4])
        .file_name(file_name.to_string())
        .mime_str("image/jpeg")
        .expect("valid mime")
}

/// A multipart part with arbitrary extension and content-type.
pub fn file_part(file_name: &str, content_type: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(b"some bytes".to_vec())
        .file_name(file_name.to_string())
        .mime_str(content_type)
        .expect("valid mime")
}

/// Multipart form with the standard product text fields.
pub fn product_form(name: &str, price: &str, quantity: &str) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("name", name.to_string())
        .text("price", price.to_string())
        .text("quantity", quantity.to_string())
}
