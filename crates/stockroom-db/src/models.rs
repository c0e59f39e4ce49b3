//! Rust structs mapping to database tables.
//!
//! [`ProductRow`] implements `from_row` for constructing itself from a
//! `rusqlite::Row`. The `images` column is carried verbatim as text; callers
//! parse it with [`parse_image_list`] so a malformed stored value surfaces as
//! [`Error::CorruptData`] instead of a panic.

use stockroom_core::{Error, ProductId, Result};

/// A product record as stored, with the image list still serialized.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: f64,
    /// JSON array of `/uploads/<filename>` path strings.
    pub images: String,
    pub quantity: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl ProductRow {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: ProductId::from(row.get::<_, i64>(0)?),
            name: row.get(1)?,
            description: row.get(2)?,
            price: row.get(3)?,
            images: row.get(4)?,
            quantity: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    /// Parse this row's stored image list.
    pub fn image_paths(&self) -> Result<Vec<String>> {
        parse_image_list(&self.images)
    }
}

/// Parse a stored image list column into path strings.
///
/// The column must be a JSON array of strings; anything else is corrupt.
pub fn parse_image_list(raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|e| Error::corrupt(format!("stored image list failed to parse: {e}")))
}

/// Serialize image paths for storage in the `images` column.
pub fn serialize_image_list(paths: &[String]) -> String {
    // Vec<String> -> JSON array cannot fail.
    serde_json::to_string(paths).unwrap_or_else(|_| "[]".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_list() {
        let paths = parse_image_list(r#"["/uploads/a.jpg", "/uploads/b.png"]"#).unwrap();
        assert_eq!(paths, vec!["/uploads/a.jpg", "/uploads/b.png"]);
    }

    #[test]
    fn parse_empty_list() {
        assert!(parse_image_list("[]").unwrap().is_empty());
    }

    #[test]
    fn parse_garbage_is_corrupt_data() {
        let err = parse_image_list("not json at all").unwrap_err();
        assert!(matches!(err, Error::CorruptData(_)));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn parse_wrong_shape_is_corrupt_data() {
        let err = parse_image_list(r#"{"a": 1}"#).unwrap_err();
        assert!(matches!(err, Error::CorruptData(_)));
    }

    #[test]
    fn serialize_round_trip() {
        let paths = vec!["/uploads/1700000000000_0.jpg".to_string()];
        let raw = serialize_image_list(&paths);
        assert_eq!(parse_image_list(&raw).unwrap(), paths);
    }
}
