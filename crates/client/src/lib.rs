//! Page-facing side of sigcache.
//!
//! This crate provides structural extraction from live pages and markup,
//! the signature cache, the bidirectional intent/locator store and the
//! legacy-entry migration adapter shared by the server.

pub mod extract;
pub mod migration;
#[cfg(feature = "render")]
pub mod render;
pub mod signature_cache;
pub mod store;

pub use extract::{ExtractError, PageEvaluator, PageSnapshot, extract_elements, extract_from_markup};
pub use migration::{MigrationAdapter, MigrationReport};
pub use signature_cache::SignatureCache;
pub use store::{BidirectionalStore, LookupResult, LookupSource, MetricsSnapshot, StoreConfig};
