//! Product Source Port - Upstream Listing Interface
//!
//! Defines the trait for retrieving the current product listing.
//! Retries, backoff and header rotation live in the adapter; the
//! monitor only sees the final outcome of one cycle's fetch.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::product::Product;

/// Why a listing fetch failed.
#[derive(Debug, Error)]
pub enum FetchError {
  /// Upstream answered 429.
  #[error("rate limited by upstream")]
  RateLimited,
  /// Upstream answered with a non-success status.
  #[error("unexpected status {0}")]
  Status(u16),
  /// Upstream answered with something other than JSON.
  #[error("unexpected content type {0:?}")]
  ContentType(String),
  /// Connection, timeout or body read failure.
  #[error("transport error: {0}")]
  Transport(String),
  /// Body was not a valid listing document.
  #[error("invalid listing payload: {0}")]
  Decode(String),
  /// Every attempt of this cycle failed.
  #[error("gave up after {attempts} attempts: {last}")]
  Exhausted {
    /// Number of attempts made.
    attempts: u32,
    /// Failure of the final attempt.
    last: Box<FetchError>,
  },
}

impl FetchError {
  /// Short label for metrics.
  pub fn reason(&self) -> &'static str {
    match self {
      Self::RateLimited => "rate_limited",
      Self::Status(_) => "status",
      Self::ContentType(_) => "content_type",
      Self::Transport(_) => "transport",
      Self::Decode(_) => "decode",
      Self::Exhausted { .. } => "exhausted",
    }
  }

  /// Whether another attempt within the same cycle may succeed.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::RateLimited | Self::Transport(_) | Self::Decode(_))
  }
}

/// Trait for product listing providers.
#[async_trait]
pub trait ProductSource: Send + Sync + 'static {
  /// Fetch the current listing (one fixed page).
  async fn fetch_products(&self) -> Result<Vec<Product>, FetchError>;
}
