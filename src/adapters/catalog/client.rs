//! Catalog HTTP Client - Retrying Listing Fetcher
//!
//! Wraps reqwest with a bounded retry budget, 429 backoff and
//! user-agent rotation for the category listing endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use crate::config::UpstreamConfig;
use crate::domain::product::Product;
use crate::ports::product_source::{FetchError, ProductSource};

/// Used only if the configured pool is empty.
const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Configuration for the catalog client.
#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
  /// Full listing URL.
  pub api_url: String,
  /// Per-request timeout.
  pub timeout: Duration,
  /// Attempts per fetch.
  pub max_attempts: u32,
  /// Pause after a transport or decode failure.
  pub retry_pause: Duration,
  /// Pause unit after a 429 (multiplied by the attempt number).
  pub rate_limit_backoff: Duration,
  /// User agents picked at random per attempt.
  pub user_agents: Vec<String>,
}

impl CatalogClientConfig {
  pub fn from_upstream(upstream: &UpstreamConfig) -> Self {
    Self {
      api_url: upstream.api_url.clone(),
      timeout: upstream.timeout(),
      max_attempts: upstream.max_attempts,
      retry_pause: Duration::from_millis(upstream.retry_pause_ms),
      rate_limit_backoff: Duration::from_millis(upstream.rate_limit_backoff_ms),
      user_agents: upstream.user_agents.clone(),
    }
  }
}

/// Listing document. Records stay raw so one bad record cannot sink
/// the whole page.
#[derive(Debug, Deserialize)]
struct ListingPage {
  #[serde(default)]
  products: Option<Vec<serde_json::Value>>,
}

/// HTTP client for the category listing.
pub struct CatalogClient {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: CatalogClientConfig,
}

impl CatalogClient {
  /// Create a new catalog client.
  pub fn new(config: CatalogClientConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(2)
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self { http, config })
  }

  fn pick_user_agent(&self) -> &str {
    self
      .config
      .user_agents
      .choose(&mut rand::thread_rng())
      .map_or(FALLBACK_USER_AGENT, String::as_str)
  }

  /// One request, classified into products or a `FetchError`.
  async fn attempt(&self, user_agent: &str) -> Result<Vec<Product>, FetchError> {
    let response = self
      .http
      .get(&self.config.api_url)
      .header(USER_AGENT, user_agent)
      .header(ACCEPT, "application/json, text/plain, */*")
      .header(ACCEPT_LANGUAGE, "en-IN,en;q=0.9")
      .send()
      .await
      .map_err(|e| FetchError::Transport(e.to_string()))?;

    match response.status() {
      StatusCode::OK => {}
      StatusCode::TOO_MANY_REQUESTS => return Err(FetchError::RateLimited),
      status => return Err(FetchError::Status(status.as_u16())),
    }

    let content_type = response
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .unwrap_or_default()
      .to_string();
    if !content_type.to_ascii_lowercase().contains("json") {
      return Err(FetchError::ContentType(content_type));
    }

    let body = response
      .bytes()
      .await
      .map_err(|e| FetchError::Transport(e.to_string()))?;

    parse_listing(&body)
  }
}

#[async_trait]
impl ProductSource for CatalogClient {
  /// Fetch the listing with up to `max_attempts` tries.
  ///
  /// 429 and transport/decode failures are retried after a pause;
  /// any other status or a non-JSON content type ends the fetch.
  #[instrument(skip(self))]
  async fn fetch_products(&self) -> Result<Vec<Product>, FetchError> {
    let max_attempts = self.config.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
      let user_agent = self.pick_user_agent();

      let error = match self.attempt(user_agent).await {
        Ok(products) => {
          debug!(attempt, products = products.len(), "Listing fetched");
          return Ok(products);
        }
        Err(e) if e.is_retryable() => e,
        Err(e) => {
          warn!(error = %e, attempt, "Listing fetch failed, skipping cycle");
          return Err(e);
        }
      };

      let pause = match error {
        FetchError::RateLimited => self.config.rate_limit_backoff * attempt,
        _ => self.config.retry_pause,
      };
      warn!(
        error = %error,
        attempt,
        max_attempts,
        pause_ms = pause.as_millis(),
        "Listing fetch attempt failed"
      );
      last_error = Some(error);

      if attempt < max_attempts {
        sleep(pause).await;
      }
    }

    Err(FetchError::Exhausted {
      attempts: max_attempts,
      last: Box::new(
        last_error.unwrap_or_else(|| FetchError::Transport("no attempt made".to_string())),
      ),
    })
  }
}

/// Decode a listing body, skipping records that fail to parse.
pub fn parse_listing(body: &[u8]) -> Result<Vec<Product>, FetchError> {
  let page: ListingPage =
    serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;

  let products = page
    .products
    .unwrap_or_default()
    .into_iter()
    .filter_map(|raw| match serde_json::from_value::<Product>(raw) {
      Ok(product) => Some(product),
      Err(e) => {
        warn!(error = %e, "Skipping malformed product record");
        None
      }
    })
    .collect();

  Ok(products)
}
