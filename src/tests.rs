#[cfg(test)]
mod integration_tests {
    use crate::{
        api, convert_image_format, ApiError, AppState, AssetStore, Capture, CaptureOptions,
        Config, ImageFormat, Metrics, ShotResponse, UploadedAsset,
    };
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tower::util::ServiceExt;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.capture_timeout, Duration::from_secs(30));
        assert_eq!(config.upload_preset, "screenshots");
        assert!(config.api_key.is_none());
        assert!(config.upload_url.is_none());
        assert_eq!(config.viewport.width, 1920);
        assert_eq!(config.viewport.height, 1080);
    }

    #[test]
    fn test_image_format_parsing() {
        assert_eq!(
            serde_json::from_str::<ImageFormat>("\"png\"").unwrap(),
            ImageFormat::Png
        );
        assert_eq!(
            serde_json::from_str::<ImageFormat>("\"jpeg\"").unwrap(),
            ImageFormat::Jpeg
        );
        assert_eq!(
            serde_json::from_str::<ImageFormat>("\"webp\"").unwrap(),
            ImageFormat::Webp
        );
        assert!(serde_json::from_str::<ImageFormat>("\"bmp\"").is_err());

        assert_eq!(ImageFormat::Jpeg.extension(), "jpeg");
        assert_eq!(ImageFormat::default(), ImageFormat::Png);
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(ApiError::MissingApiKey.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingUrl.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidUrl.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::CaptureFailed("render crashed".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Timeout(Duration::from_secs(30)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let upstream = ApiError::Upstream {
            status: 503,
            body: "service unavailable".to_string(),
        };
        assert_eq!(upstream.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(upstream.message(), "service unavailable");
        assert!(ApiError::MissingUrl.is_client_error());
        assert!(!upstream.is_client_error());
    }

    #[test]
    fn test_convert_image_format() {
        let png_data = tiny_png();

        let unchanged = convert_image_format(
            png_data.clone(),
            &CaptureOptions {
                format: ImageFormat::Png,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(unchanged, png_data);

        let jpeg = convert_image_format(
            png_data.clone(),
            &CaptureOptions {
                format: ImageFormat::Jpeg,
                quality: Some(70),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);

        let webp = convert_image_format(
            png_data,
            &CaptureOptions {
                format: ImageFormat::Webp,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(&webp[..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
    }

    // --- Handler tests ---------------------------------------------------

    struct StubCapture {
        data: Vec<u8>,
    }

    #[async_trait]
    impl Capture for StubCapture {
        async fn capture(&self, _url: &str, _options: &CaptureOptions) -> Result<Vec<u8>, ApiError> {
            Ok(self.data.clone())
        }
    }

    struct FailingCapture;

    #[async_trait]
    impl Capture for FailingCapture {
        async fn capture(&self, _url: &str, _options: &CaptureOptions) -> Result<Vec<u8>, ApiError> {
            Err(ApiError::CaptureFailed("render crashed".to_string()))
        }
    }

    struct StubStore {
        uploaded: Arc<Mutex<Option<PathBuf>>>,
    }

    #[async_trait]
    impl AssetStore for StubStore {
        async fn upload(&self, path: &Path, _format: ImageFormat) -> Result<UploadedAsset, ApiError> {
            assert!(path.exists(), "upload must see the persisted file");
            *self.uploaded.lock().unwrap() = Some(path.to_path_buf());

            let file_name = path.file_name().unwrap().to_str().unwrap();
            Ok(UploadedAsset {
                asset_id: "asset-1".to_string(),
                public_id: "shot-1".to_string(),
                url: format!("https://cdn.example.com/{file_name}"),
            })
        }
    }

    struct FailingStore {
        status: u16,
        body: String,
    }

    #[async_trait]
    impl AssetStore for FailingStore {
        async fn upload(&self, _path: &Path, _format: ImageFormat) -> Result<UploadedAsset, ApiError> {
            Err(ApiError::Upstream {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    fn test_config() -> Config {
        Config {
            image_dir: std::env::temp_dir()
                .join(format!("screenshot-api-test-{}", uuid::Uuid::new_v4())),
            ..Default::default()
        }
    }

    fn test_app(
        config: Config,
        capture: Arc<dyn Capture>,
        store: Option<Arc<dyn AssetStore>>,
    ) -> Router {
        api::router(AppState {
            config: Arc::new(config),
            capture,
            store,
            metrics: Arc::new(Metrics::new()),
            exporter: None,
        })
    }

    async fn send(app: Router, uri: &str, api_key: Option<&str>) -> (StatusCode, Option<ShotResponse>) {
        let mut builder = Request::builder().uri(uri);
        if let Some(key) = api_key {
            builder = builder.header("x-api-key", key);
        }

        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&bytes).ok())
    }

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 30, 30, 255]));
        let mut data = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut data), image::ImageFormat::Png)
            .unwrap();
        data
    }

    #[tokio::test]
    async fn test_missing_url_is_rejected() {
        let app = test_app(test_config(), Arc::new(StubCapture { data: tiny_png() }), None);

        let (status, body) = send(app, "/api/screenshot", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body = body.unwrap();
        assert_eq!(body.message, "URL is required");
        assert!(body.image.is_none());
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let app = test_app(test_config(), Arc::new(StubCapture { data: tiny_png() }), None);

        let (status, body) = send(app, "/api/screenshot?url=not%20a%20url", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.unwrap().message, "Invalid URL");
    }

    #[tokio::test]
    async fn test_missing_api_key_is_rejected() {
        let config = Config {
            api_key: Some("secret".to_string()),
            ..test_config()
        };
        let app = test_app(config, Arc::new(StubCapture { data: tiny_png() }), None);

        let (status, body) = send(app, "/api/screenshot?url=https://example.com", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.unwrap().message, "API Key is required");
    }

    #[tokio::test]
    async fn test_wrong_api_key_is_rejected() {
        let config = Config {
            api_key: Some("secret".to_string()),
            ..test_config()
        };
        let app = test_app(config, Arc::new(StubCapture { data: tiny_png() }), None);

        let (status, body) = send(
            app,
            "/api/screenshot?url=https://example.com",
            Some("wrong"),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.unwrap().message, "Unauthorized");
    }

    #[tokio::test]
    async fn test_unknown_format_is_rejected() {
        let app = test_app(test_config(), Arc::new(StubCapture { data: tiny_png() }), None);

        let (status, _) = send(app, "/api/screenshot?url=https://example.com&type=bmp", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_out_of_range_quality_is_rejected() {
        let app = test_app(test_config(), Arc::new(StubCapture { data: tiny_png() }), None);

        let (status, body) = send(
            app,
            "/api/screenshot?url=https://example.com&quality=101",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.unwrap().message, "Quality must be between 0 and 100");
    }

    #[tokio::test]
    async fn test_inline_response_carries_base64_payload() {
        let data = tiny_png();
        let app = test_app(
            test_config(),
            Arc::new(StubCapture { data: data.clone() }),
            None,
        );

        let (status, body) = send(app, "/api/screenshot?url=https://example.com", None).await;

        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        assert_eq!(body.message, "Here is your shot");
        assert_eq!(body.image, Some(STANDARD.encode(&data)));
        assert!(body.id.is_none());
    }

    #[tokio::test]
    async fn test_local_reference_uses_public_base_url() {
        let config = Config {
            public_base_url: Some("https://shots.example.com/images".to_string()),
            ..test_config()
        };
        let image_dir = config.image_dir.clone();
        let app = test_app(config, Arc::new(StubCapture { data: tiny_png() }), None);

        let (status, body) = send(
            app,
            "/api/screenshot?url=https://example.com&type=jpeg&quality=90",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let image = body.unwrap().image.unwrap();
        assert!(image.starts_with("https://shots.example.com/images/"));
        assert!(image.ends_with(".jpeg"));

        // The local file backs the returned reference
        let entries: Vec<_> = std::fs::read_dir(&image_dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_returns_asset_ids_and_removes_file() {
        let uploaded = Arc::new(Mutex::new(None));
        let store = StubStore {
            uploaded: uploaded.clone(),
        };
        let app = test_app(
            test_config(),
            Arc::new(StubCapture { data: tiny_png() }),
            Some(Arc::new(store)),
        );

        let (status, body) = send(
            app,
            "/api/screenshot?url=https://example.com&type=jpeg",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        let ids = body.id.unwrap();
        assert_eq!(ids.asset, "asset-1");
        assert_eq!(ids.public, "shot-1");

        let image = body.image.unwrap();
        assert!(image.starts_with("https://cdn.example.com/"));
        assert!(image.ends_with(".jpeg"));

        // Temp file is deleted once the asset host has a copy
        let uploaded_path = uploaded.lock().unwrap().clone().unwrap();
        assert!(!uploaded_path.exists());
    }

    #[tokio::test]
    async fn test_upload_failure_passes_upstream_status_through() {
        let store = FailingStore {
            status: 503,
            body: "asset host is down".to_string(),
        };
        let app = test_app(
            test_config(),
            Arc::new(StubCapture { data: tiny_png() }),
            Some(Arc::new(store)),
        );

        let (status, body) = send(app, "/api/screenshot?url=https://example.com", None).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.unwrap().message, "asset host is down");
    }

    #[tokio::test]
    async fn test_capture_failure_maps_to_internal_error() {
        let app = test_app(test_config(), Arc::new(FailingCapture), None);

        let (status, body) = send(app, "/api/screenshot?url=https://example.com", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body.unwrap().message,
            "Screenshot capture failed: render crashed"
        );
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app(test_config(), Arc::new(StubCapture { data: tiny_png() }), None);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_metrics_endpoint_without_exporter() {
        let app = test_app(test_config(), Arc::new(StubCapture { data: tiny_png() }), None);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
