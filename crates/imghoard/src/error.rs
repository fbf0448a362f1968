//! HTTP error taxonomy.
//!
//! Every handler failure becomes an [`ApiError`], and every `ApiError` renders
//! the same JSON shape: `{"status": 404, "error": "Image not found"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Upload missing, empty, too large, or not declared as an image.
    #[error("Invalid file")]
    InvalidFile,

    #[error("Missing id")]
    MissingId,

    #[error("Image not found")]
    NotFound,

    /// The store declined the write without reporting an error.
    #[error("Failed to save image")]
    SaveFailed,

    /// No route matched the request.
    #[error("Not found")]
    NoRoute,

    /// Anything else. The cause is logged but never sent to the client.
    #[error("An unexpected error occurred")]
    Unexpected(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidFile | ApiError::MissingId => StatusCode::BAD_REQUEST,
            ApiError::NotFound | ApiError::NoRoute => StatusCode::NOT_FOUND,
            ApiError::SaveFailed | ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub error: String,
}

/// Log `message` and build the uniform error response.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let message = message.into();
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), "{}", message);
    } else {
        tracing::warn!(status = status.as_u16(), "{}", message);
    }

    let body = ErrorBody {
        status: status.as_u16(),
        error: message,
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Unexpected(cause) = &self {
            tracing::error!("{:#}", cause);
        }
        error_response(self.status(), self.to_string())
    }
}
