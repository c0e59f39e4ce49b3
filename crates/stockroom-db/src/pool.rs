//! SQLite connection pooling.
//!
//! Both constructors hand back a pool whose schema is already migrated, so
//! callers never see a half-initialized database.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use stockroom_core::{Error, Result};

use crate::migrations;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Plenty for a single-table CRUD workload; SQLite serializes writes anyway.
const POOL_SIZE: u32 = 8;

/// Open (or create) the database file at `db_path` and return a ready pool.
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    // WAL lets reads proceed while a write is in flight.
    let manager = SqliteConnectionManager::file(db_path)
        .with_init(|conn| conn.execute_batch("PRAGMA journal_mode = WAL;"));
    build_pool(manager)
}

/// In-memory pool for tests.
///
/// Each call names its shared-cache database uniquely, so pools created by
/// parallel tests never see each other's rows while connections within one
/// pool still share state.
pub fn init_memory_pool() -> Result<DbPool> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let uri = format!(
        "file:stockroom_test_{}?mode=memory&cache=shared",
        NEXT.fetch_add(1, Ordering::Relaxed)
    );
    build_pool(SqliteConnectionManager::file(uri))
}

fn build_pool(manager: SqliteConnectionManager) -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager)
        .map_err(|e| Error::database(format!("connection pool setup failed: {e}")))?;

    let conn = pool
        .get()
        .map_err(|e| Error::database(format!("no connection available for migrations: {e}")))?;
    migrations::run_migrations(&conn)?;

    Ok(pool)
}

pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("no connection available: {e}")))
}
