//! Integration Tests - Monitor Cycle End-to-end
//!
//! Drives the monitor use case against scripted sources, recording
//! notifiers and in-memory stores. Uses mockall for trait mocking
//! and tokio::test for async tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mockall::mock;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use tokio::sync::broadcast;

use restock_monitor::adapters::metrics::MonitorMetrics;
use restock_monitor::adapters::persistence::JsonSnapshotStore;
use restock_monitor::config::AppConfig;
use restock_monitor::domain::product::Product;
use restock_monitor::domain::schedule::PollMode;
use restock_monitor::domain::sizes::SizeSet;
use restock_monitor::domain::snapshot::Snapshot;
use restock_monitor::ports::notifier::{Notifier, NotifyError};
use restock_monitor::ports::product_source::{FetchError, ProductSource};
use restock_monitor::ports::snapshot_store::SnapshotStore;
use restock_monitor::usecases::Monitor;

// ---- Mock Definitions ----

mock! {
    pub Source {}

    #[async_trait::async_trait]
    impl ProductSource for Source {
        async fn fetch_products(&self) -> Result<Vec<Product>, FetchError>;
    }
}

mock! {
    pub Notify {}

    #[async_trait::async_trait]
    impl Notifier for Notify {
        async fn send_text(&self, text: &str) -> Result<(), NotifyError>;
        async fn send_photo(&self, image_url: &str, caption: &str) -> Result<(), NotifyError>;
    }
}

mock! {
    pub Store {}

    #[async_trait::async_trait]
    impl SnapshotStore for Store {
        async fn load(&self) -> anyhow::Result<Snapshot>;
        async fn replace(&self, snapshot: &Snapshot) -> anyhow::Result<()>;
    }
}

// ---- Fakes ----

/// Returns one scripted listing per cycle, then empty listings.
struct ScriptedSource {
    listings: Mutex<VecDeque<Result<Vec<Product>, FetchError>>>,
}

impl ScriptedSource {
    fn new(listings: Vec<Result<Vec<Product>, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            listings: Mutex::new(listings.into()),
        })
    }
}

#[async_trait]
impl ProductSource for ScriptedSource {
    async fn fetch_products(&self) -> Result<Vec<Product>, FetchError> {
        self.listings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Sent {
    Text(String),
    Photo { image_url: String, caption: String },
}

/// Records every message; optionally fails all of them.
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
    fail: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn outcome(&self) -> Result<(), NotifyError> {
        if self.fail {
            Err(NotifyError::Rejected {
                status: 403,
                body: "Forbidden: bot was kicked".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(Sent::Text(text.to_string()));
        self.outcome()
    }

    async fn send_photo(&self, image_url: &str, caption: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(Sent::Photo {
            image_url: image_url.to_string(),
            caption: caption.to_string(),
        });
        self.outcome()
    }
}

/// Keeps the last written snapshot and counts writes.
#[derive(Default)]
struct MemoryStore {
    saved: Mutex<Option<Snapshot>>,
    writes: Mutex<usize>,
}

impl MemoryStore {
    fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    fn saved(&self) -> Option<Snapshot> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn load(&self) -> anyhow::Result<Snapshot> {
        Ok(self.saved().unwrap_or_default())
    }

    async fn replace(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        *self.saved.lock().unwrap() = Some(snapshot.clone());
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }
}

// ---- Helpers ----

fn product(code: &str, sizes: &[&str]) -> Product {
    let skus: Vec<_> = sizes
        .iter()
        .map(|s| json!({ "size": s, "inStock": true }))
        .collect();
    serde_json::from_value(json!({
        "code": code,
        "name": format!("Product {code}"),
        "url": format!("/p/{code}"),
        "price": { "value": 799.0, "displayformattedValue": "₹799" },
        "skuList": skus,
    }))
    .unwrap()
}

fn product_with_image(code: &str, sizes: &[&str]) -> Product {
    let mut p = product(code, sizes);
    p.images = serde_json::from_value(json!([{ "url": "https://img.example/a.jpg" }])).unwrap();
    p
}

fn sizes(items: &[&str]) -> SizeSet {
    items.iter().map(ToString::to_string).collect()
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.upstream.site_origin = "https://shop.example".to_string();
    config
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn monitor<S: ProductSource, N: Notifier, St: SnapshotStore>(
    source: Arc<S>,
    notifier: Arc<N>,
    store: Arc<St>,
    snapshot: Snapshot,
) -> Monitor<S, N, St> {
    Monitor::new(source, notifier, store, snapshot, &test_config())
        .with_rng(StdRng::seed_from_u64(7))
}

// ---- Tests ----

#[tokio::test]
async fn test_first_sighting_sends_one_new_product_alert() {
    let source = ScriptedSource::new(vec![Ok(vec![product("A1", &["M", "S"])])]);
    let notifier = Arc::new(RecordingNotifier::default());
    let store = Arc::new(MemoryStore::default());
    let mut monitor = monitor(source, Arc::clone(&notifier), Arc::clone(&store), Snapshot::new());

    let report = monitor.run_cycle(now()).await.unwrap();

    assert_eq!(report.new_products, 1);
    assert_eq!(report.alerts(), 1);
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    let Sent::Text(text) = &sent[0] else {
        panic!("expected a text message, got {sent:?}");
    };
    assert!(text.contains("NEW PRODUCT"));
    assert!(text.contains("Product A1"));
    assert!(text.contains("₹799"));
    assert!(text.contains("Sizes: M, S"));
    assert!(text.contains("https://shop.example/p/A1"));

    assert_eq!(monitor.snapshot().get("A1").unwrap().sizes, sizes(&["M", "S"]));
    assert_eq!(store.saved().unwrap(), *monitor.snapshot());
}

#[tokio::test]
async fn test_new_product_with_image_is_sent_as_photo() {
    let source = ScriptedSource::new(vec![Ok(vec![product_with_image("A1", &["M"])])]);
    let notifier = Arc::new(RecordingNotifier::default());
    let store = Arc::new(MemoryStore::default());
    let mut monitor = monitor(source, Arc::clone(&notifier), store, Snapshot::new());

    monitor.run_cycle(now()).await.unwrap();

    match notifier.sent().as_slice() {
        [Sent::Photo { image_url, caption }] => {
            assert_eq!(image_url, "https://img.example/a.jpg");
            assert!(caption.contains("NEW PRODUCT"));
        }
        other => panic!("expected one photo, got {other:?}"),
    }
}

#[tokio::test]
async fn test_size_change_sends_sold_out_and_restock() {
    let source = ScriptedSource::new(vec![
        Ok(vec![product("A1", &["S", "M"])]),
        Ok(vec![product("A1", &["M", "L"])]),
    ]);
    let notifier = Arc::new(RecordingNotifier::default());
    let store = Arc::new(MemoryStore::default());
    let mut monitor = monitor(source, Arc::clone(&notifier), Arc::clone(&store), Snapshot::new());

    monitor.run_cycle(now()).await.unwrap();
    let report = monitor.run_cycle(now()).await.unwrap();

    assert_eq!(report.sold_out, 1);
    assert_eq!(report.restocked, 1);
    assert_eq!(report.new_products, 0);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 3);
    let texts: Vec<_> = sent[1..]
        .iter()
        .map(|s| match s {
            Sent::Text(t) => t.clone(),
            Sent::Photo { .. } => panic!("change alerts are text only"),
        })
        .collect();
    assert!(texts[0].contains("SIZE SOLD OUT"));
    assert!(texts[0].contains("Sold Out: S"));
    assert!(texts[1].contains("SIZE RESTOCKED"));
    assert!(texts[1].contains("Restocked: L"));

    assert_eq!(monitor.snapshot().get("A1").unwrap().sizes, sizes(&["L", "M"]));
    assert_eq!(store.saved().unwrap().get("A1").unwrap().sizes, sizes(&["L", "M"]));
}

#[tokio::test]
async fn test_unchanged_listing_is_silent() {
    let listing = vec![product("A1", &["S", "M"]), product("B2", &[])];
    let source = ScriptedSource::new(vec![Ok(listing.clone()), Ok(listing)]);
    let notifier = Arc::new(RecordingNotifier::default());
    let store = Arc::new(MemoryStore::default());
    let mut monitor = monitor(source, Arc::clone(&notifier), Arc::clone(&store), Snapshot::new());

    monitor.run_cycle(now()).await.unwrap();
    let writes_after_first = store.writes();
    let before = monitor.snapshot().clone();

    let report = monitor.run_cycle(now()).await.unwrap();

    assert_eq!(report.alerts(), 0);
    assert_eq!(report.products_seen, 2);
    assert_eq!(notifier.sent().len(), 2);
    assert_eq!(store.writes(), writes_after_first);
    assert_eq!(*monitor.snapshot(), before);
}

#[tokio::test]
async fn test_fetch_failure_leaves_state_untouched() {
    let mut source = MockSource::new();
    source.expect_fetch_products().times(1).returning(|| {
        Err(FetchError::Exhausted {
            attempts: 3,
            last: Box::new(FetchError::RateLimited),
        })
    });

    let mut notifier = MockNotify::new();
    notifier.expect_send_text().never();
    notifier.expect_send_photo().never();

    let mut store = MockStore::new();
    store.expect_replace().never();

    let mut existing = Snapshot::new();
    existing.upsert_sizes("A1", sizes(&["M"]));

    let mut monitor = monitor(
        Arc::new(source),
        Arc::new(notifier),
        Arc::new(store),
        existing.clone(),
    );

    let outcome = monitor.run_cycle(now()).await;
    let report = outcome.as_ref().unwrap();

    assert!(report.fetch_failed());
    assert_eq!(report.fetch_failure, Some("exhausted"));
    assert_eq!(*monitor.snapshot(), existing);
    assert_eq!(
        monitor.next_delay(&outcome, Duration::ZERO, now()),
        Duration::from_secs(test_config().schedule.fetch_failure_pause_seconds)
    );
}

#[tokio::test]
async fn test_restock_enters_flash_mode() {
    let source = ScriptedSource::new(vec![Ok(vec![product("A1", &["M"])]), Ok(vec![product("A1", &["M", "L"])])]);
    let mut existing = Snapshot::new();
    existing.upsert_sizes("A1", sizes(&["M"]));
    let mut monitor = monitor(
        source,
        Arc::new(RecordingNotifier::default()),
        Arc::new(MemoryStore::default()),
        existing,
    );

    monitor.run_cycle(now()).await.unwrap();
    assert_eq!(monitor.scheduler().mode(now()), PollMode::Normal);

    let report = monitor.run_cycle(now()).await.unwrap();
    assert_eq!(report.restocked, 1);
    assert_eq!(monitor.scheduler().mode(now()), PollMode::Flash);

    let outcome = Ok(report);
    let delay = monitor.next_delay(&outcome, Duration::ZERO, now());
    assert!(delay >= Duration::from_secs(5) && delay <= Duration::from_secs(7), "{delay:?}");
}

#[tokio::test]
async fn test_sold_out_alone_keeps_normal_mode() {
    let source = ScriptedSource::new(vec![Ok(vec![product("A1", &["M"])])]);
    let mut existing = Snapshot::new();
    existing.upsert_sizes("A1", sizes(&["M", "L"]));
    let mut monitor = monitor(
        source,
        Arc::new(RecordingNotifier::default()),
        Arc::new(MemoryStore::default()),
        existing,
    );

    let report = monitor.run_cycle(now()).await.unwrap();

    assert_eq!(report.sold_out, 1);
    assert_eq!(monitor.scheduler().mode(now()), PollMode::Normal);

    let outcome = Ok(report);
    let delay = monitor.next_delay(&outcome, Duration::ZERO, now());
    assert!(delay >= Duration::from_secs(15) && delay <= Duration::from_secs(30), "{delay:?}");
}

#[tokio::test]
async fn test_notification_failure_still_updates_state() {
    let source = ScriptedSource::new(vec![Ok(vec![product("A1", &["S"]), product("B2", &["L"])])]);
    let notifier = Arc::new(RecordingNotifier::failing());
    let store = Arc::new(MemoryStore::default());
    let mut monitor = monitor(source, Arc::clone(&notifier), Arc::clone(&store), Snapshot::new());

    let report = monitor.run_cycle(now()).await.unwrap();

    assert_eq!(report.new_products, 2);
    assert_eq!(report.alerts_failed, 2);
    assert_eq!(notifier.sent().len(), 2);
    assert_eq!(monitor.snapshot().len(), 2);
    assert_eq!(store.saved().unwrap().len(), 2);
}

#[tokio::test]
async fn test_product_without_code_is_skipped() {
    let nameless: Product = serde_json::from_value(json!({ "name": "Mystery" })).unwrap();
    let source = ScriptedSource::new(vec![Ok(vec![nameless, product("A1", &[])])]);
    let notifier = Arc::new(RecordingNotifier::default());
    let mut monitor = monitor(
        source,
        Arc::clone(&notifier),
        Arc::new(MemoryStore::default()),
        Snapshot::new(),
    );

    let report = monitor.run_cycle(now()).await.unwrap();

    assert_eq!(report.products_seen, 2);
    assert_eq!(report.new_products, 1);
    assert_eq!(monitor.snapshot().len(), 1);
    let Sent::Text(text) = &notifier.sent()[0] else {
        panic!("expected text");
    };
    assert!(text.contains("Sizes: Available"));
}

#[tokio::test]
async fn test_missing_price_uses_placeholder_and_voucher_hint() {
    let mut cheap = product("C1", &["M"]);
    cheap.price = None;
    let mut offer = product("D1", &["M"]);
    offer.offer_price = serde_json::from_value(json!({ "value": 450.0, "displayformattedValue": "₹450" })).unwrap();

    let source = ScriptedSource::new(vec![Ok(vec![cheap, offer])]);
    let notifier = Arc::new(RecordingNotifier::default());
    let mut monitor = monitor(
        source,
        Arc::clone(&notifier),
        Arc::new(MemoryStore::default()),
        Snapshot::new(),
    );

    monitor.run_cycle(now()).await.unwrap();

    let texts: Vec<_> = notifier
        .sent()
        .into_iter()
        .map(|s| match s {
            Sent::Text(t) => t,
            Sent::Photo { caption, .. } => caption,
        })
        .collect();
    assert!(texts[0].contains("Price N/A"));
    assert!(texts[1].contains("₹450"));
    assert!(texts[1].contains("🎟"));
}

#[tokio::test]
async fn test_store_failure_is_cycle_error() {
    let source = ScriptedSource::new(vec![Ok(vec![product("A1", &["M"])])]);

    let mut store = MockStore::new();
    store
        .expect_replace()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("disk full")));

    let mut notifier = MockNotify::new();
    notifier.expect_send_text().never();

    let mut monitor = monitor(source, Arc::new(notifier), Arc::new(store), Snapshot::new());

    let outcome = monitor.run_cycle(now()).await;
    assert!(outcome.is_err());
    assert_eq!(
        monitor.next_delay(&outcome, Duration::ZERO, now()),
        Duration::from_secs(test_config().schedule.error_pause_seconds)
    );
}

#[tokio::test]
async fn test_restart_from_saved_snapshot_is_silent() {
    let dir = std::env::temp_dir().join(format!("restock-monitor-it-{}", uuid::Uuid::new_v4()));
    let path = dir.join("products.json");
    let listing = vec![product("A1", &["S", "M"]), product("B2", &["L"])];

    {
        let store = Arc::new(JsonSnapshotStore::new(&path).await.unwrap());
        let notifier = Arc::new(RecordingNotifier::default());
        let snapshot = store.load().await.unwrap();
        let mut first = monitor(
            ScriptedSource::new(vec![Ok(listing.clone())]),
            Arc::clone(&notifier),
            store,
            snapshot,
        );
        first.run_cycle(now()).await.unwrap();
        assert_eq!(notifier.sent().len(), 2);
    }

    let store = Arc::new(JsonSnapshotStore::new(&path).await.unwrap());
    let snapshot = store.load().await.unwrap();
    assert_eq!(snapshot.len(), 2);

    let notifier = Arc::new(RecordingNotifier::default());
    let mut second = monitor(
        ScriptedSource::new(vec![Ok(listing)]),
        Arc::clone(&notifier),
        store,
        snapshot,
    );
    let report = second.run_cycle(now()).await.unwrap();

    assert_eq!(report.alerts(), 0);
    assert!(notifier.sent().is_empty());

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_metrics_follow_cycles() {
    let metrics = Arc::new(MonitorMetrics::new().unwrap());
    let source = ScriptedSource::new(vec![Ok(vec![product("A1", &["M"])])]);
    let mut monitor = monitor(
        source,
        Arc::new(RecordingNotifier::default()),
        Arc::new(MemoryStore::default()),
        Snapshot::new(),
    )
    .with_metrics(Arc::clone(&metrics));

    let outcome = monitor.run_cycle(now()).await;
    monitor.next_delay(&outcome, Duration::ZERO, now());

    let text = metrics.render().unwrap();
    assert!(text.contains(r#"restock_monitor_alerts_sent_total{kind="new_product"} 1"#));
    assert!(text.contains("restock_monitor_tracked_products 1"));
    assert!(text.contains("restock_monitor_flash_mode 1"));
}

#[tokio::test]
async fn test_flash_gauge_clears_during_fetch_outage() {
    let metrics = Arc::new(MonitorMetrics::new().unwrap());
    let source = ScriptedSource::new(vec![
        Ok(vec![product("A1", &["M"])]),
        Err(FetchError::Exhausted {
            attempts: 3,
            last: Box::new(FetchError::Transport("connection reset".to_string())),
        }),
    ]);
    let mut monitor = monitor(
        source,
        Arc::new(RecordingNotifier::default()),
        Arc::new(MemoryStore::default()),
        Snapshot::new(),
    )
    .with_metrics(Arc::clone(&metrics));

    let first = monitor.run_cycle(now()).await;
    monitor.next_delay(&first, Duration::ZERO, now());
    assert!(metrics.render().unwrap().contains("restock_monitor_flash_mode 1"));

    let later = now() + chrono::Duration::seconds(600);
    let second = monitor.run_cycle(later).await;
    assert!(second.as_ref().unwrap().fetch_failed());
    monitor.next_delay(&second, Duration::ZERO, later);

    assert!(metrics.render().unwrap().contains("restock_monitor_flash_mode 0"));
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let source = ScriptedSource::new(vec![Ok(vec![product("A1", &["M"])])]);
    let notifier = Arc::new(RecordingNotifier::default());
    let mut monitor = monitor(
        source,
        Arc::clone(&notifier),
        Arc::new(MemoryStore::default()),
        Snapshot::new(),
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(async move { monitor.run(shutdown_rx).await });

    // First cycle runs immediately; the loop then sleeps in flash mode.
    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("monitor did not stop")
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(notifier.sent().len(), 1);
}
