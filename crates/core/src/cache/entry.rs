//! The cached intent/locator record.

use serde::{Deserialize, Serialize};

use super::expiry::is_expired;
use crate::signature::Signature;

/// Bookkeeping bytes charged per entry on top of its string payloads.
const ENTRY_OVERHEAD_BYTES: usize = 128;

/// A cached mapping between an intent and a concrete locator.
///
/// Entries without a `dom_signature` are in the legacy format and are
/// candidates for migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Store key, signature-enhanced when a signature is present.
    pub key: String,
    /// Intent text as given by the caller.
    pub intent: String,
    /// Key of the normalized intent, used by the second lookup step.
    pub normalized_key: String,
    /// Locator (or text, for reverse entries).
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dom_signature: Option<Signature>,
    pub url: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds of the last successful lookup.
    pub last_accessed: i64,
    /// In [0, 1]; 1.0 for entries recorded by discovery.
    pub confidence: f64,
}

impl CacheEntry {
    pub fn is_expired(&self, now_ms: i64, ttl_ms: u64) -> bool {
        is_expired(self.created_at, now_ms, ttl_ms)
    }

    pub fn is_legacy(&self) -> bool {
        self.dom_signature.is_none()
    }

    /// Approximate heap footprint, used for the store's size budget.
    pub fn approximate_size(&self) -> usize {
        let signature = self
            .dom_signature
            .as_ref()
            .map(|s| s.critical_hash.len() + s.important_hash.len() + s.context_hash.len() + s.full_signature.len())
            .unwrap_or(0);
        ENTRY_OVERHEAD_BYTES
            + self.key.len()
            + self.intent.len()
            + self.normalized_key.len()
            + self.value.len()
            + self.url.len()
            + signature
    }
}
