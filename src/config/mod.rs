//! Configuration Module - TOML-based Monitor Configuration
//!
//! Loads and validates configuration from `config.toml` with
//! environment variable overrides for secrets and the listen port.
//! Upstream URL, timings and message texts are externalized here -
//! nothing tunable is hardcoded in the domain layer.

pub mod loader;

use std::time::Duration;

use serde::Deserialize;

use crate::domain::pricing::VoucherTier;
use crate::domain::schedule::ScheduleParams;
use crate::domain::sizes::StockPolicy;

/// Top-level monitor configuration.
///
/// Every section has defaults, so an empty `config.toml` yields a
/// runnable (if notification-less) monitor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// Monitor identity and logging.
  pub bot: BotConfig,
  /// Upstream category API.
  pub upstream: UpstreamConfig,
  /// Adaptive polling intervals.
  pub schedule: ScheduleConfig,
  /// Telegram delivery.
  pub telegram: TelegramConfig,
  /// Alert content.
  pub alerts: AlertsConfig,
  /// Snapshot persistence.
  pub persistence: PersistenceConfig,
  /// Liveness/metrics endpoint.
  pub health: HealthConfig,
}

/// Monitor identity configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
  /// Human-readable name, used in logs.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  pub log_level: String,
}

/// Upstream category API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
  /// Full listing URL including the fixed page query.
  pub api_url: String,
  /// Origin prefixed to relative product URLs.
  pub site_origin: String,
  /// Per-request timeout in seconds.
  pub timeout_seconds: u64,
  /// Attempts per cycle.
  pub max_attempts: u32,
  /// Pause after a transport failure, in milliseconds.
  pub retry_pause_ms: u64,
  /// Pause unit after a 429, multiplied by the attempt number.
  pub rate_limit_backoff_ms: u64,
  /// User agents rotated between attempts.
  pub user_agents: Vec<String>,
  /// How variants without a stock flag are treated.
  pub stock_policy: StockPolicy,
}

/// Adaptive scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
  /// Flash mode window after activity (seconds).
  pub flash_duration_seconds: u64,
  /// Base sleep in flash mode (seconds).
  pub flash_interval_seconds: u64,
  /// Max jitter added in flash mode (milliseconds).
  pub flash_jitter_ms: u64,
  /// Normal sleep range lower bound (seconds).
  pub normal_min_seconds: u64,
  /// Normal sleep range upper bound (seconds).
  pub normal_max_seconds: u64,
  /// Pause after a failed fetch (seconds).
  pub fetch_failure_pause_seconds: u64,
  /// Pause after any other cycle error (seconds).
  pub error_pause_seconds: u64,
}

/// Telegram delivery configuration.
///
/// `bot_token` and `chat_id` normally come from `BOT_TOKEN` and
/// `CHANNEL_ID`; they are not validated until a message is sent.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
  /// Bot API base URL.
  pub api_base: String,
  /// Bot token.
  pub bot_token: Option<String>,
  /// Destination chat or channel id.
  pub chat_id: Option<String>,
  /// Timeout for text messages (seconds).
  pub text_timeout_seconds: u64,
  /// Timeout for photo messages (seconds).
  pub photo_timeout_seconds: u64,
  /// Outgoing message budget.
  pub messages_per_minute: u32,
  /// Show link previews under text messages.
  pub link_preview: bool,
}

/// Alert content configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
  /// Prefix for prices without a pre-formatted display string.
  pub currency_symbol: String,
  /// Voucher suggestion tiers (price strictly below `below`).
  pub voucher_tiers: Vec<VoucherTier>,
  /// Voucher line for prices above every tier. Blank disables it.
  pub voucher_fallback: String,
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
  /// Snapshot file path.
  pub data_file: String,
}

/// Liveness endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
  /// Bind address (without port).
  pub bind_host: String,
  /// Listen port. `PORT` overrides.
  pub port: u16,
  /// Body returned by `GET /`.
  pub message: String,
}

impl UpstreamConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_seconds)
  }
}

impl ScheduleConfig {
  /// Scheduler parameters in domain units.
  pub fn params(&self) -> ScheduleParams {
    ScheduleParams {
      flash_duration: Duration::from_secs(self.flash_duration_seconds),
      flash_interval: Duration::from_secs(self.flash_interval_seconds),
      flash_jitter: Duration::from_millis(self.flash_jitter_ms),
      normal_min: Duration::from_secs(self.normal_min_seconds),
      normal_max: Duration::from_secs(self.normal_max_seconds),
    }
  }
}

impl HealthConfig {
  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.bind_host, self.port)
  }
}

impl Default for BotConfig {
  fn default() -> Self {
    Self {
      name: "restock-monitor".to_string(),
      log_level: "info".to_string(),
    }
  }
}

impl Default for UpstreamConfig {
  fn default() -> Self {
    Self {
      api_url: default_api_url(),
      site_origin: "https://www.sheinindia.in".to_string(),
      timeout_seconds: 15,
      max_attempts: 3,
      retry_pause_ms: 2_000,
      rate_limit_backoff_ms: 10_000,
      user_agents: default_user_agents(),
      stock_policy: StockPolicy::default(),
    }
  }
}

impl Default for ScheduleConfig {
  fn default() -> Self {
    Self {
      flash_duration_seconds: 180,
      flash_interval_seconds: 5,
      flash_jitter_ms: 2_000,
      normal_min_seconds: 15,
      normal_max_seconds: 30,
      fetch_failure_pause_seconds: 10,
      error_pause_seconds: 5,
    }
  }
}

impl Default for TelegramConfig {
  fn default() -> Self {
    Self {
      api_base: "https://api.telegram.org".to_string(),
      bot_token: None,
      chat_id: None,
      text_timeout_seconds: 10,
      photo_timeout_seconds: 15,
      messages_per_minute: 20,
      link_preview: true,
    }
  }
}

impl Default for AlertsConfig {
  fn default() -> Self {
    Self {
      currency_symbol: "₹".to_string(),
      voucher_tiers: vec![
        VoucherTier {
          below: 500.0,
          label: "Use ₹500 Voucher".to_string(),
        },
        VoucherTier {
          below: 1000.0,
          label: "Use ₹1000 Voucher".to_string(),
        },
      ],
      voucher_fallback: "Eligible for ₹1000 Voucher".to_string(),
    }
  }
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_file: "products.json".to_string(),
    }
  }
}

impl Default for HealthConfig {
  fn default() -> Self {
    Self {
      bind_host: "0.0.0.0".to_string(),
      port: 8000,
      message: "RESTOCK MONITOR RUNNING ⚡".to_string(),
    }
  }
}

fn default_api_url() -> String {
  concat!(
    "https://www.sheinindia.in/api/category/sverse-5939-37961",
    "?fields=SITE&currentPage=1&pageSize=45&format=json&query=%3Arelevance",
    "&gridColumns=5&advfilter=true&platform=Desktop&showAdsOnNextPage=false",
    "&is_ads_enable_plp=true&displayRatings=true&segmentIds=&store=shein"
  )
  .to_string()
}

fn default_user_agents() -> Vec<String> {
  [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
  ]
  .into_iter()
  .map(ToString::to_string)
  .collect()
}
