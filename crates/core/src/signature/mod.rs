//! Hierarchical structural signatures.
//!
//! A page's elements are partitioned into three tiers (interactive controls,
//! structural navigation, headings/content), each tier is reduced to a
//! deterministic 16-hex-character digest, and the three digests are joined as
//! `critical:important:context`.

pub mod builder;
pub mod descriptor;
pub mod format;

pub use builder::{BuilderConfig, SignatureBuilder};
pub use descriptor::{ElementDescriptor, Tier};
pub use format::{
    EMPTY_SEGMENT, FALLBACK_SEGMENT, FALLBACK_SIGNATURE, SignatureParts, compose_signature, is_valid_signature,
    parse_signature,
};

use serde::{Deserialize, Serialize};

/// Number of elements seen per tier before truncation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ElementCounts {
    pub critical: usize,
    pub important: usize,
    pub context: usize,
}

/// Three-tier structural fingerprint of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub critical_hash: String,
    pub important_hash: String,
    pub context_hash: String,
    pub full_signature: String,
    pub element_counts: ElementCounts,
}

impl Signature {
    pub fn new(critical_hash: String, important_hash: String, context_hash: String, counts: ElementCounts) -> Self {
        let full_signature = compose_signature(&critical_hash, &important_hash, &context_hash);
        Self { critical_hash, important_hash, context_hash, full_signature, element_counts: counts }
    }

    /// The "no structural signal" sentinel.
    pub fn fallback() -> Self {
        Self::new(
            FALLBACK_SEGMENT.to_string(),
            FALLBACK_SEGMENT.to_string(),
            FALLBACK_SEGMENT.to_string(),
            ElementCounts::default(),
        )
    }

    pub fn is_fallback(&self) -> bool {
        self.full_signature == FALLBACK_SIGNATURE
    }

    /// Hashes in tier order.
    pub fn tiers(&self) -> [(Tier, &str); 3] {
        [
            (Tier::Critical, self.critical_hash.as_str()),
            (Tier::Important, self.important_hash.as_str()),
            (Tier::Context, self.context_hash.as_str()),
        ]
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_signature)
    }
}
