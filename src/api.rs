//! HTTP surface of the screenshot service
//!
//! One endpoint does the actual work: `GET /api/screenshot` validates the
//! request, captures the page, persists the image to a transient file,
//! optionally uploads it to the asset host and answers with a reference to
//! the result. `/health` and `/metrics` are operational helpers.

use crate::utils::{format_bytes, format_duration, is_valid_url};
use crate::{
    ApiError, AssetStore, Capture, CaptureOptions, ChromeCapture, Config, HttpAssetStore,
    ImageFormat, Metrics, PrometheusExporter,
};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Shared state handed to every request handler
///
/// All collaborators are explicit: configuration is read once at startup
/// and the capture/upload capabilities sit behind trait objects so tests
/// can substitute stubs.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub capture: Arc<dyn Capture>,
    pub store: Option<Arc<dyn AssetStore>>,
    pub metrics: Arc<Metrics>,
    pub exporter: Option<Arc<PrometheusExporter>>,
}

impl AppState {
    /// Wire up the production collaborators from the configuration
    pub fn new(config: Config) -> Self {
        let store: Option<Arc<dyn AssetStore>> = config.upload_url.clone().map(|endpoint| {
            Arc::new(HttpAssetStore::new(endpoint, config.upload_preset.clone()))
                as Arc<dyn AssetStore>
        });

        Self {
            capture: Arc::new(ChromeCapture::new(config.clone())),
            store,
            metrics: Arc::new(Metrics::new()),
            exporter: None,
            config: Arc::new(config),
        }
    }

    pub fn with_exporter(mut self, exporter: PrometheusExporter) -> Self {
        self.exporter = Some(Arc::new(exporter));
        self
    }
}

/// Query parameters accepted by the screenshot endpoint
#[derive(Debug, Deserialize)]
pub struct ShotParams {
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u8>,
    #[serde(rename = "type")]
    pub format: Option<ImageFormat>,
}

/// JSON body of every response from the screenshot endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ShotResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<AssetIds>,
}

/// Asset host identifiers echoed back to the client
#[derive(Debug, Serialize, Deserialize)]
pub struct AssetIds {
    pub asset: String,
    pub public: String,
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/screenshot", get(take_screenshot))
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .with_state(state)
}

/// `GET /api/screenshot?url=...&width=&height=&quality=&type=`
///
/// Linear pipeline: guard clauses, capture, persist, optional upload,
/// respond. Cleanup of the transient file happens on the upload success
/// path only.
pub async fn take_screenshot(
    State(state): State<AppState>,
    Query(params): Query<ShotParams>,
    headers: HeaderMap,
) -> Result<Json<ShotResponse>, ApiError> {
    if let Some(expected) = &state.config.api_key {
        let provided = headers
            .get("x-api-key")
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::MissingApiKey)?;

        if provided != expected {
            return Err(ApiError::Unauthorized);
        }
    }

    let url = params
        .url
        .as_deref()
        .filter(|url| !url.is_empty())
        .ok_or(ApiError::MissingUrl)?;

    if !is_valid_url(url) {
        return Err(ApiError::InvalidUrl);
    }

    if params.quality.is_some_and(|quality| quality > 100) {
        return Err(ApiError::InvalidQuality);
    }

    let options = CaptureOptions {
        width: params.width,
        height: params.height,
        quality: params.quality,
        format: params.format.unwrap_or_default(),
    };

    let started = Instant::now();
    let result = state.capture.capture(url, &options).await;
    state.metrics.record_capture(started.elapsed(), result.is_ok());

    let data = match result {
        Ok(data) => data,
        Err(e) => {
            warn!("Capture failed for {url}: {e}");
            return Err(e);
        }
    };

    info!(
        "Captured {} ({}) in {}",
        url,
        format_bytes(data.len()),
        format_duration(started.elapsed())
    );

    let filename = format!("{}.{}", Uuid::new_v4(), options.format.extension());
    let path = state.config.image_dir.join(&filename);

    tokio::fs::create_dir_all(&state.config.image_dir).await?;
    tokio::fs::write(&path, &data).await?;

    if let Some(store) = &state.store {
        let uploaded = store.upload(&path, options.format).await;
        state.metrics.record_upload(uploaded.is_ok());
        let asset = uploaded?;

        // The transient file only lives until the asset host has a copy
        tokio::fs::remove_file(&path).await?;

        info!("Uploaded {} as {}", filename, asset.public_id);

        return Ok(Json(ShotResponse {
            message: "Here is your shot".to_string(),
            image: Some(asset.url),
            id: Some(AssetIds {
                asset: asset.asset_id,
                public: asset.public_id,
            }),
        }));
    }

    // No uploader configured: reference the local file when it is publicly
    // served, otherwise inline the image
    let image = match &state.config.public_base_url {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), filename),
        None => STANDARD.encode(&data),
    };

    Ok(Json(ShotResponse {
        message: "Here is your shot".to_string(),
        image: Some(image),
        id: None,
    }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.exporter {
        Some(exporter) => exporter.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
