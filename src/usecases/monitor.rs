//! Stock Monitor - Poll, Diff, Notify, Sleep
//!
//! The monitor's single run-forever loop:
//! 1. Fetch the listing through the `ProductSource` port
//! 2. Resolve price and in-stock sizes per product
//! 3. Diff against the snapshot and persist changed entries
//! 4. Send new-product / restock / sold-out alerts (best-effort)
//! 5. Sleep for an adaptively chosen interval
//!
//! Cycle errors are logged and followed by a short pause; nothing
//! short of shutdown ends the loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::adapters::metrics::MonitorMetrics;
use crate::config::AppConfig;
use crate::domain::alert::{Alert, AlertKind};
use crate::domain::pricing::{PriceResolver, VoucherHints};
use crate::domain::product::Product;
use crate::domain::schedule::AdaptiveScheduler;
use crate::domain::sizes::{SizeDiff, StockPolicy, extract_sizes};
use crate::domain::snapshot::Snapshot;
use crate::ports::notifier::Notifier;
use crate::ports::product_source::ProductSource;
use crate::ports::snapshot_store::SnapshotStore;

/// Loop settings taken from the config.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
  /// Origin prefixed to product paths.
  pub site_origin: String,
  /// Treatment of variants without a stock flag.
  pub stock_policy: StockPolicy,
  /// Sleep after a failed fetch.
  pub fetch_failure_pause: Duration,
  /// Sleep after any other cycle error.
  pub error_pause: Duration,
}

impl MonitorSettings {
  pub fn from_config(config: &AppConfig) -> Self {
    Self {
      site_origin: config.upstream.site_origin.clone(),
      stock_policy: config.upstream.stock_policy,
      fetch_failure_pause: Duration::from_secs(config.schedule.fetch_failure_pause_seconds),
      error_pause: Duration::from_secs(config.schedule.error_pause_seconds),
    }
  }
}

/// What a single cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
  /// Products in the fetched listing.
  pub products_seen: usize,
  /// New-product alerts produced.
  pub new_products: usize,
  /// Restock alerts produced.
  pub restocked: usize,
  /// Sold-out alerts produced.
  pub sold_out: usize,
  /// Alerts the notifier failed to deliver.
  pub alerts_failed: usize,
  /// Fetch failure reason when the cycle was skipped.
  pub fetch_failure: Option<&'static str>,
}

impl CycleReport {
  fn skipped(reason: &'static str) -> Self {
    Self {
      fetch_failure: Some(reason),
      ..Self::default()
    }
  }

  pub fn fetch_failed(&self) -> bool {
    self.fetch_failure.is_some()
  }

  /// Total alerts produced, delivered or not.
  pub fn alerts(&self) -> usize {
    self.new_products + self.restocked + self.sold_out
  }

  /// New products or restocks put the scheduler into flash mode.
  pub fn has_activity(&self) -> bool {
    self.new_products > 0 || self.restocked > 0
  }

  fn count(&mut self, kind: AlertKind) {
    match kind {
      AlertKind::NewProduct => self.new_products += 1,
      AlertKind::Restocked => self.restocked += 1,
      AlertKind::SoldOut => self.sold_out += 1,
    }
  }
}

/// Polls the listing and announces stock changes.
pub struct Monitor<S: ProductSource, N: Notifier, St: SnapshotStore> {
  /// Listing port.
  source: Arc<S>,
  /// Notification port.
  notifier: Arc<N>,
  /// Persistence port.
  store: Arc<St>,
  /// Last-known stock, owned by the loop.
  snapshot: Snapshot,
  /// Flash/normal interval selection.
  scheduler: AdaptiveScheduler,
  /// Price selection for new-product alerts.
  prices: PriceResolver,
  /// Voucher line for new-product alerts.
  vouchers: VoucherHints,
  settings: MonitorSettings,
  metrics: Option<Arc<MonitorMetrics>>,
  /// Jitter source.
  rng: StdRng,
}

impl<S: ProductSource, N: Notifier, St: SnapshotStore> Monitor<S, N, St> {
  /// Create a monitor starting from `snapshot`.
  pub fn new(
    source: Arc<S>,
    notifier: Arc<N>,
    store: Arc<St>,
    snapshot: Snapshot,
    config: &AppConfig,
  ) -> Self {
    Self {
      source,
      notifier,
      store,
      snapshot,
      scheduler: AdaptiveScheduler::new(config.schedule.params()),
      prices: PriceResolver::new(config.alerts.currency_symbol.clone()),
      vouchers: VoucherHints::new(&config.alerts.voucher_tiers, &config.alerts.voucher_fallback),
      settings: MonitorSettings::from_config(config),
      metrics: None,
      rng: StdRng::from_entropy(),
    }
  }

  /// Record cycle outcomes into `metrics`.
  pub fn with_metrics(mut self, metrics: Arc<MonitorMetrics>) -> Self {
    metrics.set_tracked_products(self.snapshot.len());
    self.metrics = Some(metrics);
    self
  }

  /// Use a fixed jitter source.
  pub fn with_rng(mut self, rng: StdRng) -> Self {
    self.rng = rng;
    self
  }

  pub fn snapshot(&self) -> &Snapshot {
    &self.snapshot
  }

  pub fn scheduler(&self) -> &AdaptiveScheduler {
    &self.scheduler
  }

  /// Run cycles until a shutdown signal arrives.
  #[instrument(skip_all, name = "monitor_loop")]
  pub async fn run(&mut self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
    info!(tracked = self.snapshot.len(), "Monitor loop started");

    loop {
      let started = Instant::now();
      let outcome = self.run_cycle(Utc::now()).await;

      match &outcome {
        Ok(report) if report.fetch_failed() => self.record_cycle("fetch_failed"),
        Ok(_) => self.record_cycle("ok"),
        Err(e) => {
          error!(error = %format!("{e:#}"), "Cycle failed");
          self.record_cycle("error");
        }
      }

      let now = Utc::now();
      let delay = self.next_delay(&outcome, started.elapsed(), now);
      debug!(
        delay_ms = delay.as_millis(),
        mode = ?self.scheduler.mode(now),
        "Sleeping until next cycle"
      );

      tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
          info!("Monitor received shutdown signal");
          break;
        }
        () = sleep(delay) => {}
      }
    }

    info!("Monitor stopped cleanly");
    Ok(())
  }

  /// One fetch → diff → persist → notify pass.
  ///
  /// A failed fetch is not an error: the cycle is reported as
  /// skipped and the snapshot is left untouched. Errors are
  /// persistence failures.
  pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> Result<CycleReport> {
    let products = match self.source.fetch_products().await {
      Ok(products) => products,
      Err(e) => {
        warn!(error = %e, "Listing unavailable, skipping cycle");
        if let Some(metrics) = &self.metrics {
          metrics.record_fetch_failure(e.reason());
        }
        return Ok(CycleReport::skipped(e.reason()));
      }
    };

    let mut report = CycleReport {
      products_seen: products.len(),
      ..CycleReport::default()
    };

    for product in &products {
      let alerts = self.process_product(product).await?;
      for alert in &alerts {
        report.count(alert.kind());
        if !self.dispatch(alert).await {
          report.alerts_failed += 1;
        }
      }
    }

    if report.has_activity() {
      self.scheduler.record_activity(now);
    }

    if let Some(metrics) = &self.metrics {
      metrics.set_tracked_products(self.snapshot.len());
    }

    info!(
      products = report.products_seen,
      new = report.new_products,
      restocked = report.restocked,
      sold_out = report.sold_out,
      failed = report.alerts_failed,
      "Cycle complete"
    );

    Ok(report)
  }

  /// Sleep before the next cycle, given how this one went.
  ///
  /// Also refreshes the flash-mode gauge, whatever the outcome.
  pub fn next_delay(
    &mut self,
    outcome: &Result<CycleReport>,
    elapsed: Duration,
    now: DateTime<Utc>,
  ) -> Duration {
    if let Some(metrics) = &self.metrics {
      metrics.set_mode(self.scheduler.mode(now));
    }

    match outcome {
      Ok(report) if report.fetch_failed() => self.settings.fetch_failure_pause,
      Ok(_) => self
        .scheduler
        .next_delay(now, &mut self.rng)
        .saturating_sub(elapsed),
      Err(_) => self.settings.error_pause,
    }
  }

  /// Update the snapshot for one product and return its alerts.
  ///
  /// The store is written whenever the entry changed, before any
  /// alert is sent.
  async fn process_product(&mut self, product: &Product) -> Result<Vec<Alert>> {
    let Some(code) = product.code.as_deref() else {
      debug!(name = ?product.name, "Skipping product without code");
      return Ok(Vec::new());
    };

    let sizes = extract_sizes(product, self.settings.stock_policy);
    let name = product.display_name().to_string();
    let link = product.link(&self.settings.site_origin);

    let alerts = match self.snapshot.get(code) {
      None => {
        let price = self.prices.resolve(product);
        vec![Alert::NewProduct {
          name,
          voucher: self.vouchers.hint_for(&price).map(ToString::to_string),
          price: price.display,
          sizes: sizes.clone(),
          link,
          image_url: product.image_url().map(ToString::to_string),
        }]
      }
      Some(previous) => {
        let diff = SizeDiff::between(&previous.sizes, &sizes);
        if diff.is_empty() {
          return Ok(Vec::new());
        }

        let mut alerts = Vec::with_capacity(2);
        if !diff.sold_out.is_empty() {
          alerts.push(Alert::SoldOut {
            name: name.clone(),
            sizes: diff.sold_out,
            link: link.clone(),
          });
        }
        if !diff.restocked.is_empty() {
          alerts.push(Alert::Restocked {
            name,
            sizes: diff.restocked,
            link,
          });
        }
        alerts
      }
    };

    self.snapshot.upsert_sizes(code, sizes);
    self
      .store
      .replace(&self.snapshot)
      .await
      .with_context(|| format!("Failed to persist snapshot after updating {code}"))?;

    Ok(alerts)
  }

  /// Send one alert; failures are logged and swallowed.
  async fn dispatch(&self, alert: &Alert) -> bool {
    let kind = alert.kind();
    let text = alert.render();

    let result = match alert.image_url() {
      Some(image_url) => self.notifier.send_photo(image_url, &text).await,
      None => self.notifier.send_text(&text).await,
    };

    let delivered = match result {
      Ok(()) => {
        info!(kind = kind.as_str(), "Alert sent");
        true
      }
      Err(e) => {
        warn!(kind = kind.as_str(), error = %e, "Alert delivery failed");
        false
      }
    };

    if let Some(metrics) = &self.metrics {
      metrics.record_alert(kind, delivered);
    }
    delivered
  }

  fn record_cycle(&self, outcome: &str) {
    if let Some(metrics) = &self.metrics {
      metrics.record_cycle(outcome);
    }
  }
}
