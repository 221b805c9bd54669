//! Error-to-HTTP response conversion.
//!
//! Route handlers return `Result<T, AppError>`; the body is
//! `{ "error", "code", "stage", "request_id" }` with the status taken from
//! [`mt_core::Error::http_status`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: mt_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: mt_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn inner(&self) -> &mt_core::Error {
        &self.inner
    }
}

impl From<mt_core::Error> for AppError {
    fn from(e: mt_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.inner, "Server error in API handler");
        }

        let body = json!({
            "error": self.inner.to_string(),
            "code": self.inner.code(),
            "stage": self.inner.stage(),
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}
