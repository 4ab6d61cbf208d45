//! Use Cases Layer - Application Workflows
//!
//! Orchestrates domain logic through the port interfaces.
//!
//! Use cases:
//! - `Monitor`: the poll → diff → notify → sleep loop

pub mod monitor;

pub use monitor::{CycleReport, Monitor, MonitorSettings};
