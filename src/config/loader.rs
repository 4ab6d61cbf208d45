//! Configuration Loader - File Loading, Overrides and Validation
//!
//! Handles loading `config.toml`, applying environment overrides,
//! validating all parameters, and providing clear error messages
//! for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Environment variable holding the Telegram bot token.
pub const ENV_BOT_TOKEN: &str = "BOT_TOKEN";
/// Environment variable holding the destination chat id.
pub const ENV_CHANNEL_ID: &str = "CHANNEL_ID";
/// Environment variable set by hosting platforms for the listen port.
pub const ENV_PORT: &str = "PORT";

/// Load, override from the process environment, and validate.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - `PORT` is not a valid port number
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let mut config = parse_config(&content)?;
  apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
  validate_config(&config)?;

  info!(
    upstream = %config.upstream.api_url,
    stock_policy = ?config.upstream.stock_policy,
    data_file = %config.persistence.data_file,
    port = config.health.port,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse TOML text into a config, filling defaults.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  toml::from_str(content).context("Failed to parse config.toml")
}

/// Apply `BOT_TOKEN`, `CHANNEL_ID` and `PORT` from `lookup`.
///
/// Blank values are ignored so an empty variable does not wipe a
/// value from the file.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
  F: Fn(&str) -> Option<String>,
{
  let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

  if let Some(token) = non_blank(ENV_BOT_TOKEN) {
    config.telegram.bot_token = Some(token);
  }
  if let Some(chat_id) = non_blank(ENV_CHANNEL_ID) {
    config.telegram.chat_id = Some(chat_id);
  }
  if let Some(port) = non_blank(ENV_PORT) {
    config.health.port = port
      .trim()
      .parse()
      .with_context(|| format!("{ENV_PORT} is not a valid port: {port}"))?;
  }

  Ok(())
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty upstream URL and site origin
/// - At least one attempt and one user agent
/// - Ordered, non-zero sleep ranges
/// - A positive message budget
pub fn validate_config(config: &AppConfig) -> Result<()> {
  // Upstream validation
  anyhow::ensure!(
    !config.upstream.api_url.trim().is_empty(),
    "upstream.api_url must not be empty"
  );
  anyhow::ensure!(
    !config.upstream.site_origin.trim().is_empty(),
    "upstream.site_origin must not be empty"
  );
  anyhow::ensure!(
    config.upstream.max_attempts > 0,
    "upstream.max_attempts must be at least 1"
  );
  anyhow::ensure!(
    config.upstream.timeout_seconds > 0,
    "upstream.timeout_seconds must be positive"
  );
  anyhow::ensure!(
    !config.upstream.user_agents.is_empty(),
    "upstream.user_agents must contain at least one entry"
  );

  // Schedule validation
  let schedule = &config.schedule;
  anyhow::ensure!(
    schedule.normal_min_seconds > 0,
    "schedule.normal_min_seconds must be positive"
  );
  anyhow::ensure!(
    schedule.normal_min_seconds <= schedule.normal_max_seconds,
    "schedule.normal_min_seconds ({}) exceeds normal_max_seconds ({})",
    schedule.normal_min_seconds,
    schedule.normal_max_seconds
  );
  anyhow::ensure!(
    schedule.flash_interval_seconds > 0 || schedule.flash_jitter_ms > 0,
    "flash mode needs a non-zero interval or jitter"
  );

  // Telegram validation
  anyhow::ensure!(
    config.telegram.messages_per_minute > 0,
    "telegram.messages_per_minute must be positive"
  );
  anyhow::ensure!(
    !config.telegram.api_base.trim().is_empty(),
    "telegram.api_base must not be empty"
  );

  // Persistence validation
  anyhow::ensure!(
    !config.persistence.data_file.trim().is_empty(),
    "persistence.data_file must not be empty"
  );

  Ok(())
}
