//! stockroom-server: HTTP API server for product records and their images.
//!
//! This crate ties the other stockroom crates into a running server
//! application. It provides:
//!
//! - Axum-based HTTP API for product CRUD with multipart image uploads
//! - Filesystem blob store for uploaded images, served statically
//! - Graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod router;
pub mod routes;
pub mod uploads;

use std::net::SocketAddr;
use std::sync::Arc;

use stockroom_core::config::Config;

use crate::context::AppContext;
use crate::uploads::UploadStore;

/// Start the stockroom server.
///
/// This is the main entry point. It prepares the upload directory,
/// initializes the database, constructs the [`AppContext`], and serves the
/// HTTP API until a shutdown signal is received.
pub async fn start(config: Config) -> stockroom_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    // Blob store directory must exist before anything can be uploaded or
    // served from it.
    std::fs::create_dir_all(&config.storage.upload_dir)?;
    let uploads = Arc::new(UploadStore::new(
        config.storage.upload_dir.clone(),
        config.storage.max_file_size_bytes,
    ));

    // Initialize database.
    let db_path = &config.storage.db_path;
    let existed = db_path.exists();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created database directory {}", parent.display());
        }
    }
    let db_str = db_path.to_string_lossy();
    let db = stockroom_db::pool::init_pool(&db_str)?;
    if existed {
        tracing::info!("Database opened (existing) at {db_str}");
    } else {
        tracing::info!("Database created (new) at {db_str}");
    }

    let ctx = AppContext {
        db,
        config: Arc::new(config.clone()),
        uploads,
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| stockroom_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let app = router::build_router(ctx);

    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| stockroom_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| stockroom_core::Error::Internal(format!("Server error: {e}")))?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
