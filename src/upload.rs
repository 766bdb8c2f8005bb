//! Asset host client for multipart image uploads
//!
//! The asset host is an opaque collaborator: it receives a multipart form
//! with the image file and an `upload_preset` field, and answers with the
//! stored asset's identifiers and canonical URL.

use crate::{ApiError, ImageFormat};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Identifiers returned by the asset host for a stored image
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedAsset {
    pub asset_id: String,
    pub public_id: String,
    pub url: String,
}

/// Stores a captured image remotely
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(&self, path: &Path, format: ImageFormat) -> Result<UploadedAsset, ApiError>;
}

/// HTTP implementation posting to a configured upload endpoint
pub struct HttpAssetStore {
    client: reqwest::Client,
    endpoint: String,
    preset: String,
}

impl HttpAssetStore {
    pub fn new(endpoint: String, preset: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            preset,
        }
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn upload(&self, path: &Path, format: ImageFormat) -> Result<UploadedAsset, ApiError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("screenshot")
            .to_string();

        debug!("Uploading {} ({} bytes) to {}", file_name, bytes.len(), self.endpoint);

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(format.mime_type())?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.preset.clone());

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<UploadedAsset>()
            .await
            .map_err(|e| ApiError::UploadFailed(e.to_string()))
    }
}
