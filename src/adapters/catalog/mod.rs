//! Category Listing Adapter
//!
//! Implements the `ProductSource` port against the shop's category
//! API: one fixed GET returning `{"products": [...]}`.
//!
//! Sub-modules:
//! - `client`: HTTP client with bounded retries and header rotation

pub mod client;

pub use client::{CatalogClient, CatalogClientConfig};
