//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`stockroom_core::Error`] so that route
//! handlers can return `Result<T, AppError>` directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError {
    inner: stockroom_core::Error,
    status_override: Option<StatusCode>,
}

impl AppError {
    pub fn new(inner: stockroom_core::Error) -> Self {
        Self {
            inner,
            status_override: None,
        }
    }

    /// Force a specific status code regardless of the error's default
    /// mapping. Update and delete report a missing id as 400, not 404.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status_override = Some(status);
        self
    }
}

impl From<stockroom_core::Error> for AppError {
    fn from(e: stockroom_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_override.unwrap_or_else(|| {
            StatusCode::from_u16(self.inner.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        });

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        }

        let code = match &self.inner {
            stockroom_core::Error::NotFound { .. } => "not_found",
            stockroom_core::Error::Validation(_) => "validation_error",
            stockroom_core::Error::CorruptData(_) => "corrupt_data",
            stockroom_core::Error::Database { .. } => "database_error",
            stockroom_core::Error::Io { .. } => "io_error",
            stockroom_core::Error::Internal(_) => "internal_error",
        };

        let body = json!({
            "error": self.inner.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
