//! Restock Monitor — Entry Point
//!
//! Initializes configuration, logging, the liveness server and the
//! monitor loop. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml (path from `MONITOR_CONFIG`) + env overrides + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Bind the liveness server (`/`, `/live`, `/metrics`) on `PORT`
//! 4. Create CatalogClient (implements ProductSource port)
//! 5. Create TelegramNotifier (implements Notifier port)
//! 6. Load the stock snapshot from the JSON store
//! 7. Spawn the Monitor loop (poll → diff → notify → sleep)
//! 8. Wait for SIGINT → graceful shutdown

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

use restock_monitor::adapters::catalog::{CatalogClient, CatalogClientConfig};
use restock_monitor::adapters::metrics::{HealthServer, MonitorMetrics};
use restock_monitor::adapters::persistence::JsonSnapshotStore;
use restock_monitor::adapters::telegram::{TelegramNotifier, TelegramNotifierConfig};
use restock_monitor::config;
use restock_monitor::ports::SnapshotStore;
use restock_monitor::usecases::Monitor;

/// Environment variable naming the config file.
const ENV_CONFIG_PATH: &str = "MONITOR_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path =
        std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {config_path}"))?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.bot.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        api_url = %config.upstream.api_url,
        data_file = %config.persistence.data_file,
        "Starting restock monitor"
    );

    // ── 3. Shutdown signal channel ──────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 4. Liveness server ──────────────────────────────────
    let metrics = Arc::new(MonitorMetrics::new().context("Failed to register metrics")?);
    let health = HealthServer::new(
        config.health.bind_address(),
        &config.health.message,
        Arc::clone(&metrics),
    );
    let listener = health
        .bind()
        .await
        .context("Failed to bind liveness server")?;
    let health_handle = tokio::spawn(health.run(listener, shutdown_tx.subscribe()));

    // ── 5. Adapters ─────────────────────────────────────────
    let source = Arc::new(
        CatalogClient::new(CatalogClientConfig::from_upstream(&config.upstream))
            .context("Failed to create catalog client")?,
    );
    let notifier = Arc::new(
        TelegramNotifier::new(TelegramNotifierConfig::from_telegram(&config.telegram))
            .context("Failed to create Telegram notifier")?,
    );
    let store = Arc::new(
        JsonSnapshotStore::new(&config.persistence.data_file)
            .await
            .context("Failed to open snapshot store")?,
    );

    // A corrupt snapshot stops startup instead of re-announcing everything.
    let snapshot = store.load().await.context("Failed to load stock snapshot")?;

    // ── 6. Spawn the monitor loop ───────────────────────────
    let mut monitor =
        Monitor::new(source, notifier, store, snapshot, &config).with_metrics(Arc::clone(&metrics));
    let monitor_shutdown = shutdown_tx.subscribe();
    let monitor_handle = tokio::spawn(async move {
        if let Err(e) = monitor.run(monitor_shutdown).await {
            error!(error = %e, "Monitor loop failed");
        }
    });

    info!("All tasks spawned, monitor is running");

    // ── 7. Wait for SIGINT ──────────────────────────────────
    signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("SIGINT received, initiating graceful shutdown");

    let _ = shutdown_tx.send(());

    // Wait for the in-flight cycle to finish (up to 30s)
    if tokio::time::timeout(Duration::from_secs(30), monitor_handle)
        .await
        .is_err()
    {
        error!("Monitor did not stop within 30s");
    }

    let _ = tokio::time::timeout(Duration::from_secs(5), health_handle).await;

    info!("Shutdown complete");
    Ok(())
}
