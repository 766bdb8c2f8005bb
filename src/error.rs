use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::time::Duration;
use thiserror::Error;

/// Error type covering the whole request pipeline
///
/// Client input errors map to 4xx, downstream failures to the upstream
/// status when one is known and to 500 otherwise. Nothing is retried; every
/// failure is terminal for its request.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("API Key is required")]
    MissingApiKey,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("URL is required")]
    MissingUrl,

    #[error("Invalid URL")]
    InvalidUrl,

    #[error("Quality must be between 0 and 100")]
    InvalidQuality,

    #[error("Browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("Page error: {0}")]
    PageError(String),

    #[error("Screenshot capture failed: {0}")]
    CaptureFailed(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Upstream error ({status})")]
    Upstream { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingApiKey
            | ApiError::MissingUrl
            | ApiError::InvalidUrl
            | ApiError::InvalidQuality => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }

    /// Message placed in the JSON response body
    ///
    /// Upstream failures pass the downstream body through verbatim, the way
    /// the asset host reported it.
    pub fn message(&self) -> String {
        match self {
            ApiError::Upstream { body, .. } if !body.is_empty() => body.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "message": self.message() }));
        (self.status(), body).into_response()
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::NetworkError(err.to_string())
    }
}
