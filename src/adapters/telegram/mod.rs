//! Telegram Bot API Adapter
//!
//! Implements the `Notifier` port with the Bot API `sendMessage` and
//! `sendPhoto` methods, paced by a governor rate limiter.

pub mod client;

pub use client::{TelegramNotifier, TelegramNotifierConfig};
