//! Persistence Adapters - JSON File Storage
//!
//! Implements the `SnapshotStore` port with a single JSON file that
//! is rewritten atomically on every update. No database dependency.

pub mod json_store;

pub use json_store::JsonSnapshotStore;
