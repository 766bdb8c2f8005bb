use clap::Parser;
use screenshot_api::{api, AppState, Config, PrometheusExporter};
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use url::Url;

#[derive(Parser)]
#[command(name = "screenshot-api")]
#[command(about = "HTTP screenshot capture service")]
#[command(version = "0.1.0")]
struct Cli {
    #[arg(long, help = "Configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, help = "Bind address")]
    bind: Option<String>,

    #[arg(long, help = "Server port")]
    port: Option<u16>,

    #[arg(long, help = "Capture timeout in seconds")]
    timeout: Option<u64>,

    #[arg(long, help = "Chrome executable path")]
    chrome_path: Option<String>,

    #[arg(long, help = "Enable the Prometheus metrics endpoint")]
    metrics: bool,

    #[arg(long, help = "Enable verbose logging")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    setup_logging(args.verbose)?;

    info!("Starting screenshot-api v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args).await?;

    let mut state = AppState::new(config.clone());
    if args.metrics {
        state = state.with_exporter(PrometheusExporter::install()?);
        info!("Prometheus metrics enabled at /metrics");
    }

    let app = api::router(state);

    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("screenshot-api stopped");
    Ok(())
}

async fn load_config(args: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if let Some(config_path) = &args.config {
        // Load from file
        let config_content = tokio::fs::read_to_string(config_path).await?;
        serde_json::from_str(&config_content)?
    } else {
        // Use default configuration
        Config::default()
    };

    // Override with CLI arguments
    if let Some(bind) = &args.bind {
        config.bind_addr = bind.clone();
    }

    if let Some(port) = args.port {
        config.port = port;
    }

    if let Some(timeout) = args.timeout {
        config.capture_timeout = Duration::from_secs(timeout);
    }

    if let Some(chrome_path) = &args.chrome_path {
        config.chrome_path = Some(chrome_path.clone());
    }

    // Environment wins over file and CLI
    config.apply_env();

    validate_config(&config)?;

    info!("Configuration loaded successfully");
    info!(
        "Viewport: {}x{}",
        config.viewport.width, config.viewport.height
    );
    info!("Capture timeout: {:?}", config.capture_timeout);
    info!("API key required: {}", config.api_key.is_some());
    info!("Upload endpoint configured: {}", config.upload_url.is_some());

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if config.viewport.width == 0 || config.viewport.height == 0 {
        return Err("Viewport dimensions must be greater than 0".into());
    }

    if config.capture_timeout.as_secs() == 0 {
        return Err("Capture timeout must be greater than 0".into());
    }

    if let Some(upload_url) = &config.upload_url {
        Url::parse(upload_url).map_err(|e| format!("Invalid upload URL: {e}"))?;
    }

    if let Some(base_url) = &config.public_base_url {
        Url::parse(base_url).map_err(|e| format!("Invalid public base URL: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .expect("Failed to create SIGINT handler");
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("Failed to create SIGTERM handler");

    tokio::select! {
        _ = sigint.recv() => {
            info!("Received SIGINT");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM");
        }
    }
}

fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    Ok(())
}
