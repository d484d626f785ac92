//! Cache entry model and optional SQLite persistence.
//!
//! This module provides the entry type shared by the in-memory store and the
//! persistent backend, plus:
//!
//! - Stable cache key generation (base and signature-enhanced keys)
//! - Pure expiry computation, independent of any timer
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod entry;
pub mod expiry;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entry::CacheEntry;
pub use expiry::{expired_keys, is_expired, now_ms};
pub use hash::{compute_cache_key, enhance_cache_key};
