//! Metrics and Liveness Adapters
//!
//! Provides the Prometheus registry and the axum 0.7 server that
//! answers the hosting platform's keep-alive probe on `/` and exposes
//! `/live` and `/metrics`.

pub mod health;
pub mod prometheus;

pub use health::HealthServer;
pub use prometheus::MonitorMetrics;
