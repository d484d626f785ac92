//! Signature string grammar: `critical:important:context`.
//!
//! Each segment is 1 to 16 lowercase hex characters. Two literals exist outside
//! the grammar: `empty` for a tier with no elements and `fallback` for a page
//! whose structure could not be read.

use std::sync::LazyLock;

use regex::Regex;

/// Segment used for a tier that contained no elements.
pub const EMPTY_SEGMENT: &str = "empty";

/// Segment used in all three positions when extraction or hashing failed.
pub const FALLBACK_SEGMENT: &str = "fallback";

/// Full sentinel signature for "no structural signal".
pub const FALLBACK_SIGNATURE: &str = "fallback:fallback:fallback";

/// Number of hex characters kept from each tier digest.
pub const HASH_LEN: usize = 16;

static SIGNATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-f0-9]{1,16}:[a-f0-9]{1,16}:[a-f0-9]{1,16}$").expect("signature pattern compiles")
});

/// The three hash segments of a parsed signature string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureParts {
    pub critical: String,
    pub important: String,
    pub context: String,
}

/// Join three segments into a signature string.
pub fn compose_signature(critical: &str, important: &str, context: &str) -> String {
    format!("{critical}:{important}:{context}")
}

/// Whether `value` follows the three-segment hex grammar.
pub fn is_valid_signature(value: &str) -> bool {
    SIGNATURE_RE.is_match(value)
}

/// Split a signature string into its segments.
///
/// Returns `None` for anything outside the hex grammar, including strings
/// that contain the `empty` or `fallback` literals.
pub fn parse_signature(value: &str) -> Option<SignatureParts> {
    if !is_valid_signature(value) {
        return None;
    }
    let mut parts = value.split(':');
    Some(SignatureParts {
        critical: parts.next()?.to_string(),
        important: parts.next()?.to_string(),
        context: parts.next()?.to_string(),
    })
}
