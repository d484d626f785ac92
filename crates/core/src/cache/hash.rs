//! Cache key generation.

use sha2::{Digest, Sha256};

use crate::signature::Signature;

/// Compute the base cache key for an intent on a page URL.
pub fn compute_cache_key(url: &str, intent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b"\n");
    hasher.update(intent.as_bytes());
    hex::encode(hasher.finalize())
}

/// Bind a base key to a page structure.
///
/// Two textually identical intents on structurally different pages get
/// different keys. Without a usable signature the base key is returned as is.
pub fn enhance_cache_key(base_key: &str, signature: Option<&Signature>) -> String {
    match signature {
        Some(sig) if !sig.is_fallback() => format!("{base_key}@{}", sig.full_signature),
        _ => base_key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::ElementCounts;

    fn sig(critical: &str) -> Signature {
        Signature::new(critical.into(), "bb".into(), "cc".into(), ElementCounts::default())
    }

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("https://example.com", "click login");
        let hash2 = compute_cache_key("https://example.com", "click login");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_intent() {
        let a = compute_cache_key("https://example.com", "click login");
        let b = compute_cache_key("https://example.com", "click logout");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_no_boundary_collision() {
        let a = compute_cache_key("https://example.com/a", "b");
        let b = compute_cache_key("https://example.com/", "ab");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("https://example.com", "click");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_enhanced_key_depends_on_structure() {
        let base = compute_cache_key("https://example.com", "click");
        let a = enhance_cache_key(&base, Some(&sig("aa")));
        let b = enhance_cache_key(&base, Some(&sig("ab")));
        assert_ne!(a, b);
        assert!(a.starts_with(&base));
        assert!(a.ends_with("aa:bb:cc"));
    }

    #[test]
    fn test_enhanced_key_without_signal() {
        let base = compute_cache_key("https://example.com", "click");
        assert_eq!(enhance_cache_key(&base, None), base);
        assert_eq!(enhance_cache_key(&base, Some(&Signature::fallback())), base);
    }
}
