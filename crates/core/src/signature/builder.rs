//! Reduces an element list to a three-tier [`Signature`].
//!
//! ### Algorithm
//! 1. Partition descriptors into tiers via [`ElementDescriptor::tier`].
//! 2. Sort each tier by tag, `id`, `class`, text, then the full token.
//! 3. Keep the first `max_elements_per_tier` elements of each sorted tier.
//! 4. Render each element as a canonical token and join the tokens with `|`.
//! 5. Hash with SHA-256 and keep the first 16 hex characters; an empty tier is `empty`.

use std::cmp::Ordering;
use std::fmt::Write as _;

use sha2::{Digest, Sha256};

use super::format::{EMPTY_SEGMENT, HASH_LEN};
use super::{ElementCounts, ElementDescriptor, Signature, Tier};

/// Settings for signature construction.
///
/// Text and position inclusion change the token grammar, so two builders with
/// different settings produce different hashes for the same page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Maximum elements hashed per tier (default: 50).
    pub max_elements_per_tier: usize,
    /// Append `{text}` to tokens (default: true).
    pub include_text: bool,
    /// Append `@position` to tokens (default: false).
    pub include_position: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self { max_elements_per_tier: 50, include_text: true, include_position: false }
    }
}

/// Deterministic signature builder.
#[derive(Debug, Clone, Default)]
pub struct SignatureBuilder {
    config: BuilderConfig,
}

impl SignatureBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Build a signature from an element list.
    ///
    /// Any element order yields the same signature for the same element set.
    pub fn build(&self, elements: &[ElementDescriptor]) -> Signature {
        let mut critical = Vec::new();
        let mut important = Vec::new();
        let mut context = Vec::new();

        for el in elements {
            match el.tier() {
                Some(Tier::Critical) => critical.push(el),
                Some(Tier::Important) => important.push(el),
                Some(Tier::Context) => context.push(el),
                None => {}
            }
        }

        let counts = ElementCounts { critical: critical.len(), important: important.len(), context: context.len() };

        Signature::new(self.tier_hash(critical), self.tier_hash(important), self.tier_hash(context), counts)
    }

    /// Canonical token for one element.
    ///
    /// Grammar: `tag[#id][.class.tokens][ [type="…"]][ [role="…"]][ [name="…"]][{text}][@position]`
    pub fn element_token(&self, el: &ElementDescriptor) -> String {
        let mut token = el.tag.clone();

        if let Some(id) = el.attr("id").filter(|v| !v.is_empty()) {
            let _ = write!(token, "#{id}");
        }
        if let Some(class) = el.attr("class") {
            for part in class.split_whitespace() {
                let _ = write!(token, ".{part}");
            }
        }
        for name in ["type", "role", "name"] {
            if let Some(value) = el.attr(name) {
                let _ = write!(token, " [{name}=\"{value}\"]");
            }
        }
        if self.config.include_text
            && let Some(text) = el.text_content.as_deref()
        {
            let _ = write!(token, "{{{text}}}");
        }
        if self.config.include_position
            && let Some(position) = el.position
        {
            let _ = write!(token, "@{position}");
        }

        token
    }

    fn tier_hash(&self, elements: Vec<&ElementDescriptor>) -> String {
        if elements.is_empty() {
            return EMPTY_SEGMENT.to_string();
        }

        let mut keyed: Vec<(&ElementDescriptor, String)> =
            elements.into_iter().map(|el| (el, self.element_token(el))).collect();
        keyed.sort_by(|(a, ta), (b, tb)| sort_key(a, b).then_with(|| ta.cmp(tb)));
        keyed.truncate(self.config.max_elements_per_tier);

        let joined = keyed.iter().map(|(_, token)| token.as_str()).collect::<Vec<_>>().join("|");
        let digest = hex::encode(Sha256::digest(joined.as_bytes()));
        digest[..HASH_LEN].to_string()
    }
}

fn sort_key(a: &ElementDescriptor, b: &ElementDescriptor) -> Ordering {
    a.tag
        .cmp(&b.tag)
        .then_with(|| a.attr("id").unwrap_or_default().cmp(b.attr("id").unwrap_or_default()))
        .then_with(|| a.attr("class").unwrap_or_default().cmp(b.attr("class").unwrap_or_default()))
        .then_with(|| {
            a.text_content
                .as_deref()
                .unwrap_or_default()
                .cmp(b.text_content.as_deref().unwrap_or_default())
        })
}
