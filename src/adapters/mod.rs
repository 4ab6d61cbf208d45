//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, file I/O, HTTP server). Each
//! sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `catalog`: Shop category listing client
//! - `telegram`: Telegram Bot API notifier
//! - `metrics`: Prometheus registry and liveness server
//! - `persistence`: JSON snapshot file

pub mod catalog;
pub mod metrics;
pub mod persistence;
pub mod telegram;
