//! Configuration management with serde serialization/deserialization
//!
//! This module provides all configuration structures for the screenshot API,
//! including server settings, browser viewport defaults, and per-request
//! capture options.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the screenshot API
///
/// Controls the HTTP server, the headless browser, and the optional asset
/// upload target. Loaded from a JSON file, then overridden by CLI arguments
/// and finally by the environment (see [`Config::apply_env`]).
///
/// # Examples
///
/// ```rust
/// use screenshot_api::Config;
///
/// // Use default configuration
/// let config = Config::default();
///
/// // Create custom configuration
/// let config = Config {
///     port: 8080,
///     api_key: Some("secret".to_string()),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Address the HTTP server binds to (default: "0.0.0.0")
    pub bind_addr: String,

    /// Port the HTTP server listens on (default: 3000)
    pub port: u16,

    /// API key required in the `x-api-key` header (default: None)
    ///
    /// When None, the endpoint is unprotected and the header is ignored.
    pub api_key: Option<String>,

    /// Asset host endpoint for multipart image uploads (default: None)
    ///
    /// When None, captured images are kept locally and the response carries
    /// either a local URL or an inline base64 payload.
    pub upload_url: Option<String>,

    /// Value sent as the `upload_preset` form field (default: "screenshots")
    pub upload_preset: String,

    /// Public base URL for serving locally persisted images (default: None)
    ///
    /// Only used when no upload endpoint is configured.
    pub public_base_url: Option<String>,

    /// Directory for transient image files (default: `<tmp>/screenshot-api`)
    ///
    /// Created on demand. Files are deleted after a successful upload.
    pub image_dir: PathBuf,

    /// Default browser viewport, overridable per request
    pub viewport: Viewport,

    /// Timeout for a single capture operation (default: 30 seconds)
    ///
    /// Pages that take longer than this fail the request with a 500.
    pub capture_timeout: Duration,

    /// Path to Chrome/Chromium executable (default: auto-detect)
    pub chrome_path: Option<String>,

    /// Custom User-Agent string for page loads (default: Chrome default)
    pub user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 3000,
            api_key: None,
            upload_url: None,
            upload_preset: "screenshots".to_string(),
            public_base_url: None,
            image_dir: std::env::temp_dir().join("screenshot-api"),
            viewport: Viewport::default(),
            capture_timeout: Duration::from_secs(30),
            chrome_path: None,
            user_agent: None,
        }
    }
}

impl Config {
    /// Fold environment variables into the configuration
    ///
    /// `API_KEY`, `UPLOAD_URL` and `PUBLIC_URL` override their file/CLI
    /// counterparts. Called once at startup; nothing reads the environment
    /// at request time.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("API_KEY") {
            self.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("UPLOAD_URL") {
            self.upload_url = Some(url);
        }
        if let Ok(url) = std::env::var("PUBLIC_URL") {
            self.public_base_url = Some(url);
        }
    }
}

/// Browser viewport configuration
///
/// Controls the window size and display characteristics used when rendering
/// pages. Per-request `width`/`height` options override these defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Viewport {
    /// Viewport width in pixels (default: 1920)
    pub width: u32,

    /// Viewport height in pixels (default: 1080)
    pub height: u32,

    /// Device pixel ratio for high-DPI displays (default: 1.0)
    pub device_scale_factor: f64,

    /// Whether to emulate a mobile device (default: false)
    pub mobile: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            device_scale_factor: 1.0,
            mobile: false,
        }
    }
}

/// Supported output image formats
///
/// - PNG: lossless compression, larger files, best quality
/// - JPEG: lossy compression, honors the `quality` option
/// - WebP: modern format, encoded losslessly here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl Default for ImageFormat {
    fn default() -> Self {
        Self::Png
    }
}

impl ImageFormat {
    /// File extension for this format, also used in response references
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
        }
    }

    /// MIME type sent with the multipart upload
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }
}

/// Rendering options for a single capture, taken from the query string
#[derive(Debug, Clone, Default)]
pub struct CaptureOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u8>,
    pub format: ImageFormat,
}

/// Generate Chrome command-line arguments based on configuration
///
/// Each call produces a unique user data directory so that per-request
/// browser launches never collide on Chrome's profile singleton.
pub fn get_chrome_args(config: &Config) -> Vec<String> {
    let unique_id = format!("{}-{}", std::process::id(), uuid::Uuid::new_v4());

    let mut args = vec![
        "--headless".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-extensions".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-sync".to_string(),
        "--no-first-run".to_string(),
        "--hide-scrollbars".to_string(),
        "--mute-audio".to_string(),
        format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        ),
        format!("--user-data-dir=/tmp/screenshot-api-{}", unique_id),
    ];

    if let Some(user_agent) = &config.user_agent {
        args.push(format!("--user-agent={user_agent}"));
    }

    args
}

/// Build a chromiumoxide browser configuration from the service config
pub fn create_browser_config(
    config: &Config,
) -> Result<chromiumoxide::browser::BrowserConfig, String> {
    use chromiumoxide::browser::BrowserConfig;

    let mut builder = BrowserConfig::builder()
        .window_size(config.viewport.width, config.viewport.height)
        .args(get_chrome_args(config));

    if let Some(chrome_path) = &config.chrome_path {
        builder = builder.chrome_executable(chrome_path);
    }

    builder.build()
}
