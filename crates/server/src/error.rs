//! API error types.

use crate::export::ExportError;
use crate::gateway::{FetchError, UploadError};
use axum::Json;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use saycheese_documents::DocumentError;
use saycheese_storage::StorageError;
use serde::Serialize;

/// Basic-auth challenge sent with every 401.
pub const ADMIN_CHALLENGE: &str = "Basic realm=\"saycheese admin\"";

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("upload failed: {0}")]
    Upload(UploadError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("document error: {0}")]
    Document(#[from] DocumentError),
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::TooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            _ if err.is_body_limit() => Self::PayloadTooLarge(err.to_string()),
            UploadError::Empty | UploadError::Multipart(_) => Self::BadRequest(err.to_string()),
            other => Self::Upload(other),
        }
    }
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::Upload(_) => "upload_error",
            Self::Fetch(_) => "fetch_error",
            Self::Export(_) => "export_error",
            Self::Storage(_) => "storage_error",
            Self::Document(_) => "document_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Storage(e) => match e {
                StorageError::NotFound(_) => StatusCode::NOT_FOUND,
                StorageError::InvalidKey(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Upload(_)
            | Self::Fetch(_)
            | Self::Export(_)
            | Self::Document(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }

        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static(ADMIN_CHALLENGE),
            );
        }
        response
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
