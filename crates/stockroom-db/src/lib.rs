//! stockroom-db: record store access for products.
//!
//! SQLite-backed storage with connection pooling, embedded migrations, the
//! product row model, and the product query module.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
