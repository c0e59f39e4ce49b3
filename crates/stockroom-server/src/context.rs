//! Application context shared by all request handlers.
//!
//! [`AppContext`] is the struct passed to every route handler via Axum
//! state. Infrastructure handles (DB pool, blob store) are initialized once
//! at startup and injected here rather than looked up through globals.

use std::sync::Arc;

use stockroom_core::config::Config;
use stockroom_db::pool::DbPool;

use crate::uploads::UploadStore;

/// Application context shared by all request handlers (via Axum state).
///
/// This is cheaply cloneable because it only holds `Arc`s and the pool
/// handle.
#[derive(Clone)]
pub struct AppContext {
    /// Database connection pool.
    pub db: DbPool,
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// Filesystem blob store for uploaded images.
    pub uploads: Arc<UploadStore>,
}
