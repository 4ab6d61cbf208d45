//! Prometheus Metrics Registry - Monitor Observability
//!
//! Registers the monitor's counters and gauges and renders them in
//! the Prometheus text format for the `/metrics` endpoint.

use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::domain::alert::AlertKind;
use crate::domain::schedule::PollMode;

/// Centralized Prometheus metrics for the monitor.
///
/// All metrics follow the naming convention `restock_monitor_*`.
pub struct MonitorMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// Completed cycles by outcome (`ok`, `fetch_failed`, `error`).
    pub cycles: IntCounterVec,
    /// Failed listing fetches by reason.
    pub fetch_failures: IntCounterVec,
    /// Alerts delivered by kind.
    pub alerts_sent: IntCounterVec,
    /// Alerts that failed to deliver by kind.
    pub alerts_failed: IntCounterVec,
    /// Products currently in the snapshot.
    pub tracked_products: IntGauge,
    /// Flash mode status (1 = flash, 0 = normal).
    pub flash_mode: IntGauge,
}

impl MonitorMetrics {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let cycles = IntCounterVec::new(
            Opts::new("restock_monitor_cycles_total", "Poll cycles by outcome"),
            &["outcome"],
        )?;

        let fetch_failures = IntCounterVec::new(
            Opts::new(
                "restock_monitor_fetch_failures_total",
                "Failed listing fetches by reason",
            ),
            &["reason"],
        )?;

        let alerts_sent = IntCounterVec::new(
            Opts::new("restock_monitor_alerts_sent_total", "Alerts delivered"),
            &["kind"],
        )?;

        let alerts_failed = IntCounterVec::new(
            Opts::new(
                "restock_monitor_alerts_failed_total",
                "Alerts that could not be delivered",
            ),
            &["kind"],
        )?;

        let tracked_products = IntGauge::new(
            "restock_monitor_tracked_products",
            "Products in the stock snapshot",
        )?;

        let flash_mode = IntGauge::new(
            "restock_monitor_flash_mode",
            "Whether flash polling is active (1=yes, 0=no)",
        )?;

        // Register all metrics
        registry.register(Box::new(cycles.clone()))?;
        registry.register(Box::new(fetch_failures.clone()))?;
        registry.register(Box::new(alerts_sent.clone()))?;
        registry.register(Box::new(alerts_failed.clone()))?;
        registry.register(Box::new(tracked_products.clone()))?;
        registry.register(Box::new(flash_mode.clone()))?;

        Ok(Self {
            registry,
            cycles,
            fetch_failures,
            alerts_sent,
            alerts_failed,
            tracked_products,
            flash_mode,
        })
    }

    pub fn record_cycle(&self, outcome: &str) {
        self.cycles.with_label_values(&[outcome]).inc();
    }

    pub fn record_fetch_failure(&self, reason: &str) {
        self.fetch_failures.with_label_values(&[reason]).inc();
    }

    pub fn record_alert(&self, kind: AlertKind, delivered: bool) {
        let counter = if delivered {
            &self.alerts_sent
        } else {
            &self.alerts_failed
        };
        counter.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn set_tracked_products(&self, count: usize) {
        self.tracked_products
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    pub fn set_mode(&self, mode: PollMode) {
        self.flash_mode.set(i64::from(mode == PollMode::Flash));
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
