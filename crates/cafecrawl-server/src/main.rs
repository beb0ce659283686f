use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use cafecrawl_client::KakaoClient;
use cafecrawl_core::zone::{load_zones, seoul_districts};
use cafecrawl_core::{CrawlService, Pacer};
use cafecrawl_db::Database;
use cafecrawl_server::routes;
use cafecrawl_server::state::AppState;

const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("cafecrawl=info".parse()?))
        .with_target(false)
        .init();

    let admin_token = std::env::var("CAFECRAWL_ADMIN_TOKEN").ok();
    if admin_token.is_none() {
        tracing::warn!("CAFECRAWL_ADMIN_TOKEN not set, crawl endpoint disabled");
    }
    let port = std::env::var("CAFECRAWL_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");

    let delay_ms = match std::env::var("CAFECRAWL_REQUEST_DELAY_MS") {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("Invalid CAFECRAWL_REQUEST_DELAY_MS '{raw}'"))?,
        Err(_) => 300,
    };
    let zones = match std::env::var("CAFECRAWL_ZONES_FILE") {
        Ok(path) => load_zones(&PathBuf::from(path))?,
        Err(_) => seoul_districts(),
    };

    let db = Database::from_env().await?;
    let client = KakaoClient::from_env()?;
    let crawler = CrawlService::new(
        client,
        db.cafe_repo(),
        Pacer::new(Duration::from_millis(delay_ms)),
    );

    let state = Arc::new(AppState::new(db, crawler, zones, admin_token));
    let shutdown = state.shutdown.clone();

    let app = routes::router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
