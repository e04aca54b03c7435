use anyhow::Result;
use chrono::Utc;
use diskwatch_server::config::{ServerConfig, DEFAULT_CONFIG_PATH};
use diskwatch_server::sampler::{snapshot_mounts, Sampler};
use diskwatch_server::state::{AppState, SnapshotHandle};
use diskwatch_server::{app, watchlist};
use diskwatch_stats::SysinfoStatsProvider;
use diskwatch_storage::SampleStore;
use diskwatch_trend::TrendEngine;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("diskwatch=info".parse()?))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::load(&path)?,
        None => ServerConfig::load_or_default(DEFAULT_CONFIG_PATH)?,
    };

    tracing::info!(
        http_port = config.http_port,
        database = %config.database_path,
        watchlist = %config.watchlist_path,
        interval_secs = config.log_interval_secs,
        "diskwatch starting"
    );

    // Startup configuration failures are the only fatal errors.
    let watched = watchlist::load_watchlist(Path::new(&config.watchlist_path))?;
    let store = Arc::new(SampleStore::open(Path::new(&config.database_path))?);

    // Take an initial snapshot so the dashboard has data before the first
    // aligned sampling tick, which may be most of an interval away.
    let mut provider = SysinfoStatsProvider::new();
    let (initial, skipped) = snapshot_mounts(&mut provider, &watched);
    if !skipped.is_empty() {
        tracing::warn!(
            skipped = skipped.len(),
            "Some watched mounts were unreadable at startup"
        );
    }
    let snapshots = Arc::new(SnapshotHandle::new(initial));

    let trend = Arc::new(TrendEngine::new(store.clone()));
    let state = AppState {
        snapshots: snapshots.clone(),
        store: store.clone(),
        trend,
        start_time: Utc::now(),
    };

    let sampler = Sampler::new(
        store,
        snapshots,
        Box::new(provider),
        watched,
        config.log_interval_secs,
        config.tick_timeout_secs,
    );
    let sampler_handle = tokio::spawn(sampler.run());

    let http_addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    let http_app = app::build_http_app(state);
    tracing::info!(http = %http_addr, "Server started");

    tokio::select! {
        result = axum::serve(listener, http_app) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server error");
            }
        }
        _ = signal::ctrl_c() => {
            tracing::info!("Shutting down gracefully");
        }
    }

    sampler_handle.abort();
    tracing::info!("Server stopped");

    Ok(())
}
