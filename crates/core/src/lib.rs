//! Core types and shared functionality for sigcache.
//!
//! This crate provides:
//! - Structural signatures built from element descriptors
//! - Context-aware similarity scoring with action-conflict detection
//! - Cache entry model and SQLite persistence backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod intent;
pub mod signature;
pub mod similarity;

pub use cache::{CacheDb, CacheEntry};
pub use config::AppConfig;
pub use error::Error;
pub use signature::{BuilderConfig, ElementDescriptor, Signature, SignatureBuilder};
pub use similarity::{OperationKind, SimilarityContext, SimilarityEngine};
