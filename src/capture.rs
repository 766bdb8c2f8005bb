//! Screenshot capture backed by headless Chrome
//!
//! Each capture launches its own browser instance, renders the page and
//! tears everything down again, so requests never share browser state.

use crate::{create_browser_config, ApiError, CaptureOptions, Config, ImageFormat};
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::time::timeout;
use tracing::debug;

/// JPEG quality used when the request does not specify one
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Renders a URL to encoded image bytes
///
/// The production implementation drives headless Chrome; tests substitute
/// a stub.
#[async_trait]
pub trait Capture: Send + Sync {
    async fn capture(&self, url: &str, options: &CaptureOptions) -> Result<Vec<u8>, ApiError>;
}

/// Chrome-backed capture implementation
pub struct ChromeCapture {
    config: Config,
}

impl ChromeCapture {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    async fn launch_and_render(
        &self,
        url: &str,
        options: &CaptureOptions,
    ) -> Result<Vec<u8>, ApiError> {
        let browser_config =
            create_browser_config(&self.config).map_err(ApiError::BrowserLaunchFailed)?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ApiError::BrowserLaunchFailed(e.to_string()))?;

        // The handler stream must be polled for the browser to make progress
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler error: {e}");
                    break;
                }
            }
        });

        let result = self.render_page(&browser, url, options).await;

        let _ = browser.close().await;
        handler_task.abort();

        result
    }

    async fn render_page(
        &self,
        browser: &Browser,
        url: &str,
        options: &CaptureOptions,
    ) -> Result<Vec<u8>, ApiError> {
        debug!("Navigating to {url}");

        let page = browser
            .new_page(url)
            .await
            .map_err(|e| ApiError::PageError(e.to_string()))?;

        self.apply_viewport(&page, options).await?;

        page.wait_for_navigation()
            .await
            .map_err(|e| ApiError::PageError(e.to_string()))?;

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();

        let png_data = page
            .screenshot(params)
            .await
            .map_err(|e| ApiError::CaptureFailed(e.to_string()))?;

        let _ = page.close().await;

        convert_image_format(png_data, options)
    }

    async fn apply_viewport(&self, page: &Page, options: &CaptureOptions) -> Result<(), ApiError> {
        let viewport = &self.config.viewport;
        let width = options.width.unwrap_or(viewport.width);
        let height = options.height.unwrap_or(viewport.height);

        let emulation = SetDeviceMetricsOverrideParams::builder()
            .width(width)
            .height(height)
            .device_scale_factor(viewport.device_scale_factor)
            .mobile(viewport.mobile)
            .build()
            .map_err(ApiError::PageError)?;

        page.execute(emulation)
            .await
            .map_err(|e| ApiError::PageError(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl Capture for ChromeCapture {
    async fn capture(&self, url: &str, options: &CaptureOptions) -> Result<Vec<u8>, ApiError> {
        match timeout(
            self.config.capture_timeout,
            self.launch_and_render(url, options),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(self.config.capture_timeout)),
        }
    }
}

/// Re-encode the captured PNG into the requested output format
///
/// Chrome always hands back PNG; JPEG honors the quality option, WebP is
/// encoded losslessly.
pub fn convert_image_format(
    png_data: Vec<u8>,
    options: &CaptureOptions,
) -> Result<Vec<u8>, ApiError> {
    match options.format {
        ImageFormat::Png => Ok(png_data),
        ImageFormat::Jpeg => {
            let img = image::load_from_memory(&png_data)
                .map_err(|e| ApiError::CaptureFailed(e.to_string()))?;

            // JPEG has no alpha channel
            let rgb = img.to_rgb8();

            let mut jpeg_data = Vec::new();
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut jpeg_data,
                options.quality.unwrap_or(DEFAULT_JPEG_QUALITY),
            );
            encoder
                .encode_image(&rgb)
                .map_err(|e| ApiError::CaptureFailed(e.to_string()))?;

            Ok(jpeg_data)
        }
        ImageFormat::Webp => {
            let img = image::load_from_memory(&png_data)
                .map_err(|e| ApiError::CaptureFailed(e.to_string()))?;

            let mut webp_data = Vec::new();
            img.write_to(
                &mut std::io::Cursor::new(&mut webp_data),
                image::ImageFormat::WebP,
            )
            .map_err(|e| ApiError::CaptureFailed(e.to_string()))?;

            Ok(webp_data)
        }
    }
}
