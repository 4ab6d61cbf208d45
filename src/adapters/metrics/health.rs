//! Liveness Server - Keep-alive and Metrics Endpoints
//!
//! Exposes `/` (fixed confirmation text for the hosting platform's
//! health check), `/live` and `/metrics` via axum 0.7. Shares nothing
//! with the monitor loop except the metrics registry.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use super::prometheus::MonitorMetrics;

/// State shared with request handlers.
#[derive(Clone)]
struct HealthState {
    /// Body of `GET /`.
    message: Arc<str>,
    /// Registry rendered by `GET /metrics`.
    metrics: Arc<MonitorMetrics>,
}

/// Axum-based liveness HTTP server.
pub struct HealthServer {
    state: HealthState,
    /// Bind address, `host:port`.
    bind_address: String,
}

impl HealthServer {
    /// Create a new liveness server.
    pub fn new(
        bind_address: impl Into<String>,
        message: &str,
        metrics: Arc<MonitorMetrics>,
    ) -> Self {
        Self {
            state: HealthState {
                message: Arc::from(message),
                metrics,
            },
            bind_address: bind_address.into(),
        }
    }

    /// Routes served by the liveness endpoint.
    fn router(&self) -> Router {
        Router::new()
            .route("/", get(Self::home))
            .route("/live", get(Self::liveness))
            .route("/metrics", get(Self::metrics))
            .with_state(self.state.clone())
    }

    /// Bind the listener. Split from `run` so bind errors surface at
    /// startup.
    pub async fn bind(&self) -> anyhow::Result<TcpListener> {
        let listener = TcpListener::bind(&self.bind_address).await?;
        info!(address = %self.bind_address, "Liveness server bound");
        Ok(listener)
    }

    /// Serve on an already bound listener until shutdown.
    #[instrument(skip_all, fields(address = %self.bind_address))]
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let app = self.router();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Fixed confirmation text.
    async fn home(State(state): State<HealthState>) -> impl IntoResponse {
        (StatusCode::OK, state.message.to_string())
    }

    /// Liveness probe: always returns 200 if the process is running.
    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    /// Prometheus text exposition.
    async fn metrics(State(state): State<HealthState>) -> impl IntoResponse {
        match state.metrics.render() {
            Ok(body) => (StatusCode::OK, body),
            Err(e) => {
                warn!(error = %e, "Failed to render metrics");
                (StatusCode::INTERNAL_SERVER_ERROR, String::new())
            }
        }
    }
}
