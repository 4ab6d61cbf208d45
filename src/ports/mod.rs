//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `ProductSource`: Upstream category listing
//! - `Notifier`: Outgoing chat notifications
//! - `SnapshotStore`: Persistence of the last-known stock snapshot

pub mod notifier;
pub mod product_source;
pub mod snapshot_store;

pub use notifier::{NotifyError, Notifier};
pub use product_source::{FetchError, ProductSource};
pub use snapshot_store::SnapshotStore;
