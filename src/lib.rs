//! # Screenshot API
//!
//! A small HTTP service that renders web pages to images using headless
//! Chrome. A request names a URL and rendering options, the service captures
//! the page, optionally uploads the image to a third-party asset host and
//! answers with a reference to the result.
//!
//! ## Features
//!
//! - **Single endpoint**: `GET /api/screenshot` with `url`, `width`,
//!   `height`, `quality` and `type` (png | jpeg | webp) query parameters
//! - **Optional API key**: requests must carry `x-api-key` when a key is
//!   configured
//! - **Asset host uploads**: multipart upload to a configured endpoint,
//!   with the transient local file deleted after a successful upload
//! - **Three response modes**: remote asset URL with identifiers, local
//!   public URL, or inline base64
//! - **Operational endpoints**: `/health` and (opt-in) Prometheus
//!   `/metrics`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use screenshot_api::{api, AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let app = api::router(AppState::new(config));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## HTTP Usage
//!
//! ```bash
//! curl -H 'x-api-key: secret' \
//!   'http://localhost:3000/api/screenshot?url=https://example.com&type=jpeg&quality=90'
//! ```
//!
//! A successful response carries `{ "message": "Here is your shot",
//! "image": ..., "id": { "asset": ..., "public": ... } }`; the `id` object
//! is present only when an asset host is configured.

/// Configuration and per-request capture options
pub mod config;

/// Error types and HTTP status mapping
pub mod error;

/// Headless Chrome capture behind the [`Capture`] trait
pub mod capture;

/// Asset host uploads behind the [`AssetStore`] trait
pub mod upload;

/// Router, request handler and response types
pub mod api;

/// Capture and upload counters, Prometheus exporter
pub mod metrics;

/// URL validation, debounce/sleep helpers and formatting utilities
pub mod utils;

#[cfg(test)]
mod tests;

pub use api::{AppState, AssetIds, ShotParams, ShotResponse};
pub use capture::{convert_image_format, Capture, ChromeCapture, DEFAULT_JPEG_QUALITY};
pub use config::{
    create_browser_config, get_chrome_args, CaptureOptions, Config, ImageFormat, Viewport,
};
pub use error::ApiError;
pub use metrics::{Metrics, PrometheusExporter};
pub use upload::{AssetStore, HttpAssetStore, UploadedAsset};
pub use utils::{format_bytes, format_duration, is_valid_url, sleep_ms, Debouncer};
