//! Intent text normalization and likeness.

use std::collections::BTreeSet;

/// Case-fold, replace punctuation with spaces, and collapse whitespace.
///
/// `"  Click the 'Log-In' button! "` becomes `"click the log in button"`.
pub fn normalize_intent(text: &str) -> String {
    let mapped = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tokens of the normalized intent, in order.
pub fn intent_tokens(text: &str) -> Vec<String> {
    normalize_intent(text).split(' ').filter(|t| !t.is_empty()).map(str::to_string).collect()
}

/// Dice coefficient over the distinct tokens of two intents, in [0, 1].
///
/// Two blank intents are considered identical.
pub fn intent_similarity(a: &str, b: &str) -> f64 {
    let left: BTreeSet<String> = intent_tokens(a).into_iter().collect();
    let right: BTreeSet<String> = intent_tokens(b).into_iter().collect();

    if left.is_empty() && right.is_empty() {
        return 1.0;
    }
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let shared = left.intersection(&right).count() as f64;
    2.0 * shared / (left.len() + right.len()) as f64
}
