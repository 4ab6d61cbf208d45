//! Telegram Notifier - Bot API Delivery
//!
//! Posts HTML messages and photos to a single chat. Delivery is
//! best-effort: every call has its own timeout and failures are
//! returned to the caller, which logs and moves on.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::config::TelegramConfig;
use crate::ports::notifier::{NotifyError, Notifier};

/// Configuration for the Telegram notifier.
#[derive(Debug, Clone)]
pub struct TelegramNotifierConfig {
    /// Bot API base URL.
    pub api_base: String,
    /// Bot token; checked on first send.
    pub bot_token: Option<String>,
    /// Destination chat id; checked on first send.
    pub chat_id: Option<String>,
    /// Timeout for `sendMessage`.
    pub text_timeout: Duration,
    /// Timeout for `sendPhoto`.
    pub photo_timeout: Duration,
    /// Outgoing message budget per minute.
    pub messages_per_minute: u32,
    /// Show link previews under text messages.
    pub link_preview: bool,
}

impl TelegramNotifierConfig {
    pub fn from_telegram(config: &TelegramConfig) -> Self {
        Self {
            api_base: config.api_base.clone(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            text_timeout: Duration::from_secs(config.text_timeout_seconds),
            photo_timeout: Duration::from_secs(config.photo_timeout_seconds),
            messages_per_minute: config.messages_per_minute,
            link_preview: config.link_preview,
        }
    }

    /// Whether both the token and the chat id are present.
    pub fn is_complete(&self) -> bool {
        non_blank(self.bot_token.as_deref()).is_some() && non_blank(self.chat_id.as_deref()).is_some()
    }
}

/// Telegram Bot API notifier.
pub struct TelegramNotifier {
    /// Underlying HTTP client.
    http: Client,
    /// Notifier configuration.
    config: TelegramNotifierConfig,
    /// Paces outgoing messages.
    limiter: DefaultDirectRateLimiter,
}

impl TelegramNotifier {
    /// Create a new notifier. Missing credentials are not an error here.
    pub fn new(config: TelegramNotifierConfig) -> Result<Self> {
        let http = Client::builder()
            .pool_max_idle_per_host(2)
            .build()
            .context("Failed to build HTTP client")?;

        let per_minute = NonZeroU32::new(config.messages_per_minute).unwrap_or(NonZeroU32::MIN);
        let limiter = RateLimiter::direct(Quota::per_minute(per_minute));

        if !config.is_complete() {
            warn!("BOT_TOKEN or CHANNEL_ID not set, notifications will fail");
        }

        Ok(Self {
            http,
            config,
            limiter,
        })
    }

    /// POST a form to a Bot API method.
    async fn call(
        &self,
        method: &str,
        form: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<(), NotifyError> {
        let token = non_blank(self.config.bot_token.as_deref())
            .ok_or(NotifyError::NotConfigured("BOT_TOKEN"))?;

        self.limiter.until_ready().await;

        let url = format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            token,
            method
        );

        // Errors carry the URL, which embeds the token.
        let response = self
            .http
            .post(&url)
            .timeout(timeout)
            .form(form)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(method, "Telegram message delivered");
        Ok(())
    }

    fn chat_id(&self) -> Result<&str, NotifyError> {
        non_blank(self.config.chat_id.as_deref()).ok_or(NotifyError::NotConfigured("CHANNEL_ID"))
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    #[instrument(skip(self, text), fields(len = text.len()))]
    async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        let chat_id = self.chat_id()?;
        let disable_preview = if self.config.link_preview { "false" } else { "true" };

        self.call(
            "sendMessage",
            &[
                ("chat_id", chat_id),
                ("text", text),
                ("parse_mode", "HTML"),
                ("disable_web_page_preview", disable_preview),
            ],
            self.config.text_timeout,
        )
        .await
    }

    #[instrument(skip(self, caption))]
    async fn send_photo(&self, image_url: &str, caption: &str) -> Result<(), NotifyError> {
        let chat_id = self.chat_id()?;

        self.call(
            "sendPhoto",
            &[
                ("chat_id", chat_id),
                ("photo", image_url),
                ("caption", caption),
                ("parse_mode", "HTML"),
            ],
            self.config.photo_timeout,
        )
        .await
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
