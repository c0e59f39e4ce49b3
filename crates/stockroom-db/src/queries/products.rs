//! Product CRUD operations.

use chrono::Utc;
use rusqlite::Connection;
use stockroom_core::{Error, ProductId, Result};

use crate::models::ProductRow;

/// Column list used in SELECT statements.
const COLS: &str = "id, name, description, price, images, quantity, created_at, updated_at";

/// List all products in insertion order.
pub fn list_products(conn: &Connection) -> Result<Vec<ProductRow>> {
    let q = format!("SELECT {COLS} FROM products ORDER BY id ASC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], ProductRow::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Get a product by ID.
pub fn get_product(conn: &Connection, id: ProductId) -> Result<Option<ProductRow>> {
    let q = format!("SELECT {COLS} FROM products WHERE id = ?1");
    let result = conn.query_row(&q, [id.as_i64()], ProductRow::from_row);
    match result {
        Ok(p) => Ok(Some(p)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Insert a new product and return its generated id.
pub fn insert_product(
    conn: &Connection,
    name: &str,
    description: &str,
    price: f64,
    images: &str,
    quantity: i64,
) -> Result<ProductId> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO products (name, description, price, images, quantity, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![name, description, price, images, quantity, &now, &now],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(ProductId::from(conn.last_insert_rowid()))
}

/// Rewrite every mutable field of a product.
///
/// Returns `false` when no row with the given id exists.
pub fn update_product(
    conn: &Connection,
    id: ProductId,
    name: &str,
    description: &str,
    price: f64,
    images: &str,
    quantity: i64,
) -> Result<bool> {
    let now = Utc::now().to_rfc3339();
    let n = conn
        .execute(
            "UPDATE products SET name=?1, description=?2, price=?3, images=?4,
                quantity=?5, updated_at=?6
             WHERE id=?7",
            rusqlite::params![name, description, price, images, quantity, now, id.as_i64()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete a product by ID.
pub fn delete_product(conn: &Connection, id: ProductId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM products WHERE id = ?1", [id.as_i64()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
