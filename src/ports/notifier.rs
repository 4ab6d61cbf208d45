//! Notifier Port - Outgoing Message Interface
//!
//! Fire-and-forget delivery to a chat channel. Callers log failures
//! and move on; there is no retry and no delivery guarantee.

use async_trait::async_trait;
use thiserror::Error;

/// Why a notification was not delivered.
#[derive(Debug, Error)]
pub enum NotifyError {
  /// Bot token or chat id missing.
  #[error("notifier not configured: {0} is missing")]
  NotConfigured(&'static str),
  /// Provider answered with a non-success status.
  #[error("provider rejected message with status {status}: {body}")]
  Rejected {
    /// HTTP status code.
    status: u16,
    /// Response body, for the log.
    body: String,
  },
  /// Connection or timeout failure.
  #[error("transport error: {0}")]
  Transport(String),
}

/// Trait for notification channels.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
  /// Send a rich-text message.
  async fn send_text(&self, text: &str) -> Result<(), NotifyError>;

  /// Send an image with a rich-text caption.
  async fn send_photo(&self, image_url: &str, caption: &str) -> Result<(), NotifyError>;
}
