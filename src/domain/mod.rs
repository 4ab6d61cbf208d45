//! Domain layer - Core stock-tracking logic and models.
//!
//! Pure logic with no I/O: parsing of upstream product records,
//! price resolution, size extraction and diffing, the persisted
//! snapshot, the adaptive poll scheduler and alert rendering.

pub mod alert;
pub mod pricing;
pub mod product;
pub mod schedule;
pub mod sizes;
pub mod snapshot;

// Re-export core types for convenience
pub use alert::{Alert, AlertKind};
pub use pricing::{PriceResolver, ResolvedPrice, VoucherHints, VoucherTier};
pub use product::{Product, ProductCode};
pub use schedule::{AdaptiveScheduler, PollMode, ScheduleParams};
pub use sizes::{SizeDiff, SizeSet, StockPolicy, extract_sizes};
pub use snapshot::{Snapshot, TrackedProduct};
