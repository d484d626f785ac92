//! Store maintenance tools.
//!
//! This module provides the metrics query, purging and legacy migration.

pub mod metrics;
pub mod migrate;
pub mod purge;

pub use metrics::metrics_impl;
pub use migrate::{CacheMigrateParams, migrate_impl};
pub use purge::{CachePurgeParams, purge_impl};
