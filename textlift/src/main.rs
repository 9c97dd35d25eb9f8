use std::net::SocketAddr;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use textlift::api::{create_router, AppState};
use textlift::config::Config;
use textlift::ocr::OcrProvider;

#[derive(Parser)]
#[command(name = "textlift")]
#[command(about = "Thin OCR extraction API with content-addressed caching and rate limiting")]
struct Args {
    /// Override the listen host from TEXTLIFT_HOST
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port from TEXTLIFT_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "textlift=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Initializing OCR provider...");
    let ocr = OcrProvider::new(&config.ocr);
    if !ocr.is_available() {
        tracing::warn!(
            "OCR provider unavailable - extraction requests will fail. Set OCR_API_KEY to enable it."
        );
    }

    let state = AppState::new(config.clone(), ocr);

    let cancel_token = CancellationToken::new();

    tracing::info!("Starting rate limit janitor...");
    let limiter = state.limiter.clone();
    let idle_eviction_secs = state.config.rate_limit.idle_eviction_secs;
    let token = cancel_token.child_token();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("Rate limit janitor shutting down...");
                    break;
                }
                _ = tokio::time::sleep(tokio::time::Duration::from_secs(60)) => {
                    limiter.purge_idle(std::time::Duration::from_secs(idle_eviction_secs));
                }
            }
        }
    });

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Textlift starting on http://{}", addr);
    tracing::info!("  Extract:      http://{}/api/extract-text", addr);
    tracing::info!("  Health check: http://{}/api/health", addr);
    tracing::info!("  Cache stats:  http://{}/api/cache/stats", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(cancel_token))
    .await?;

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, cancelling background tasks...");
    cancel_token.cancel();
}
