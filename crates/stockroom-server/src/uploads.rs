//! Filesystem blob store and upload intake for product images.
//!
//! Validates incoming multipart image files (extension and declared
//! content-type against the jpg/jpeg/png/gif family, per-file size ceiling)
//! and persists accepted files under a time-derived name. Files land on disk
//! before the owning record write happens, so every caller that fails after
//! intake owes a compensating [`UploadStore::remove_paths`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::multipart::Field;
use stockroom_core::{Error, Result};

/// Public URL prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Accepted file extensions, matched case-insensitively.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Accepted declared content-types for the same image family.
const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif"];

/// Filesystem manager for uploaded image files.
///
/// Files are stored flat under `root` as `<unix_millis>_<seq>.<ext>`; the
/// sequence counter disambiguates uploads landing in the same millisecond.
pub struct UploadStore {
    root: PathBuf,
    max_file_size: u64,
    seq: AtomicU64,
}

impl UploadStore {
    /// Create a new `UploadStore` rooted at the given directory.
    pub fn new(root: PathBuf, max_file_size: u64) -> Self {
        Self {
            root,
            max_file_size,
            seq: AtomicU64::new(0),
        }
    }

    /// The blob store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate a multipart file part and return its normalized extension
    /// (without the dot).
    ///
    /// Both the filename extension and the declared content-type must fall in
    /// the accepted image family; either check failing rejects the part.
    pub fn validate_part(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<String> {
        let name = file_name
            .ok_or_else(|| Error::Validation("image part is missing a filename".into()))?;

        let ext = name
            .rsplit_once('.')
            .map(|(_, e)| e.to_ascii_lowercase())
            .filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
            .ok_or_else(|| {
                Error::Validation(format!(
                    "only images are allowed (jpg, jpeg, png, gif): {name}"
                ))
            })?;

        let declared = content_type
            .ok_or_else(|| Error::Validation("image part is missing a content-type".into()))?;
        if !ALLOWED_CONTENT_TYPES.contains(&declared.to_ascii_lowercase().as_str()) {
            return Err(Error::Validation(format!(
                "unsupported image content-type: {declared}"
            )));
        }

        Ok(ext)
    }

    /// Drain a validated multipart field to disk and return its public path.
    ///
    /// The per-file ceiling is enforced while reading chunks so an oversized
    /// upload is rejected without being written.
    pub async fn store_field(&self, mut field: Field<'_>) -> Result<String> {
        let ext = self.validate_part(field.file_name(), field.content_type())?;

        let mut data: Vec<u8> = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| Error::Validation(format!("upload read error: {e}")))?
        {
            if data.len() as u64 + chunk.len() as u64 > self.max_file_size {
                return Err(Error::Validation(format!(
                    "file exceeds maximum size of {} bytes",
                    self.max_file_size
                )));
            }
            data.extend_from_slice(&chunk);
        }

        self.store_bytes(&ext, &data)
    }

    /// Persist raw bytes under a freshly generated time-derived name.
    pub fn store_bytes(&self, ext: &str, data: &[u8]) -> Result<String> {
        let filename = self.generate_filename(ext);
        let path = self.root.join(&filename);
        std::fs::write(&path, data)?;
        Ok(format!("{PUBLIC_PREFIX}/{filename}"))
    }

    /// Map a stored public path (`/uploads/<filename>`) back to its location
    /// on disk. Returns `None` for paths outside the store.
    pub fn fs_path(&self, public_path: &str) -> Option<PathBuf> {
        let filename = public_path.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        // Stored names are flat; anything with separators or parent refs is
        // not ours.
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return None;
        }
        Some(self.root.join(filename))
    }

    /// Best-effort removal of stored files.
    ///
    /// Failures are logged and never propagated; a missing file is not an
    /// error.
    pub fn remove_paths(&self, paths: &[String]) {
        for public_path in paths {
            let Some(path) = self.fs_path(public_path) else {
                tracing::warn!("Refusing to delete path outside the blob store: {public_path}");
                continue;
            };
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!("Deleted image file {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!("Image file already gone: {}", path.display());
                }
                Err(e) => {
                    tracing::warn!("Failed to delete image file {}: {e}", path.display());
                }
            }
        }
    }

    fn generate_filename(&self, ext: &str) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("{millis}_{n}.{ext}")
    }
}
