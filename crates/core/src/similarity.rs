//! Context-aware similarity between signatures.
//!
//! ### Scoring
//! Each tier is compared on its own: a critical match weighs 3, important 2,
//! context 1, and the score is the matched weight over 6. The fallback
//! sentinel never matches anything, itself included.
//!
//! ### Thresholds
//! Thresholds depend on what the caller is doing with the result; see
//! [`OperationKind::threshold`].
//!
//! ### Action conflicts
//! Two intents naming opposite actions (log in / log out, create / delete...)
//! are never matched, whatever their structural score.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::intent::intent_tokens;
use crate::signature::{FALLBACK_SEGMENT, Signature, Tier};

const TOTAL_WEIGHT: f64 = 6.0;

/// Mutually exclusive action poles; each pole lists equivalent phrasings.
const ACTION_CONFLICTS: &[(&[&str], &[&str])] = &[
    (&["login", "log in", "signin", "sign in"], &["logout", "log out", "signout", "sign out"]),
    (&["create"], &["delete"]),
    (&["add"], &["remove"]),
    (&["enable"], &["disable"]),
    (&["open"], &["close"]),
    (&["show"], &["hide"]),
    (&["expand"], &["collapse"]),
    (&["start"], &["stop"]),
    (&["accept"], &["decline"]),
    (&["approve"], &["reject"]),
    (&["subscribe"], &["unsubscribe"]),
    (&["lock"], &["unlock"]),
    (&["check"], &["uncheck"]),
    (&["select"], &["deselect"]),
    (&["follow"], &["unfollow"]),
    (&["increase"], &["decrease"]),
    (&["upload"], &["download"]),
    (&["connect"], &["disconnect"]),
    (&["play"], &["pause"]),
];

/// What a similarity comparison is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Matching cached test scenarios across similar pages.
    TestSearch,
    /// Fuzzy locator lookup in the store.
    CacheLookup,
    /// Matching recurring page patterns.
    PatternMatch,
    /// Matching across deployment environments.
    CrossEnv,
}

impl OperationKind {
    /// Minimum score a comparison must reach for this operation.
    pub fn threshold(self) -> f64 {
        match self {
            OperationKind::TestSearch => 0.35,
            OperationKind::CacheLookup => 0.15,
            OperationKind::PatternMatch => 0.25,
            OperationKind::CrossEnv => 0.40,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::TestSearch => "test_search",
            OperationKind::CacheLookup => "cache_lookup",
            OperationKind::PatternMatch => "pattern_match",
            OperationKind::CrossEnv => "cross_env",
        }
    }
}

/// Per-call comparison context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityContext {
    pub operation: OperationKind,
    pub threshold: f64,
}

impl SimilarityContext {
    /// Context with the operation's default threshold.
    pub fn new(operation: OperationKind) -> Self {
        Self { operation, threshold: operation.threshold() }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

/// Host and path of a URL; query and fragment are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageOrigin {
    pub host: String,
    pub path: String,
}

impl PageOrigin {
    /// Split a URL into host and path.
    ///
    /// Unparseable input keeps the whole string as the path with an empty host.
    pub fn parse(url: &str) -> Self {
        match Url::parse(url) {
            Ok(parsed) => Self {
                host: parsed.host_str().unwrap_or_default().to_ascii_lowercase(),
                path: parsed.path().trim_end_matches('/').to_string(),
            },
            Err(_) => Self { host: String::new(), path: url.trim().to_string() },
        }
    }

    pub fn same_host(&self, other: &Self) -> bool {
        self.host == other.host
    }

    pub fn same_path(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

/// One side of a contextual comparison.
#[derive(Debug, Clone, Copy)]
pub struct MatchSubject<'a> {
    pub intent: &'a str,
    pub signature: &'a Signature,
    pub url: &'a str,
}

/// Why a comparison was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// The intents name opposite actions.
    ActionConflict,
    /// One side carries the fallback sentinel.
    NoStructuralSignal,
    /// The score did not reach the context threshold.
    BelowThreshold,
}

/// Result of a contextual comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOutcome {
    /// Score after any cross-environment penalty, in [0, 1].
    pub score: f64,
    pub rejection: Option<Rejection>,
}

impl MatchOutcome {
    pub fn accepted(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Stateless scorer; construct one per store.
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    cross_env_penalty: f64,
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self { cross_env_penalty: 0.1 }
    }
}

impl SimilarityEngine {
    pub fn new(cross_env_penalty: f64) -> Self {
        Self { cross_env_penalty: cross_env_penalty.clamp(0.0, 1.0) }
    }

    pub fn cross_env_penalty(&self) -> f64 {
        self.cross_env_penalty
    }

    /// Tier-weighted structural score in [0, 1]. Symmetric.
    pub fn score(&self, a: &Signature, b: &Signature) -> f64 {
        if a.is_fallback() || b.is_fallback() {
            return 0.0;
        }

        let matched: f64 = a
            .tiers()
            .iter()
            .zip(b.tiers().iter())
            .filter(|((_, ha), (_, hb))| ha == hb && *ha != FALLBACK_SEGMENT)
            .map(|((tier, _), _)| tier_weight(*tier))
            .sum();

        matched / TOTAL_WEIGHT
    }

    /// Whether `score` clears the context threshold.
    pub fn accepts(&self, score: f64, ctx: &SimilarityContext) -> bool {
        score >= ctx.threshold
    }

    /// Whether two intents name opposite poles of the same action pair.
    pub fn has_action_conflict(&self, a: &str, b: &str) -> bool {
        let left = intent_tokens(a);
        let right = intent_tokens(b);

        ACTION_CONFLICTS.iter().any(|(pos, neg)| {
            let (lp, ln) = (mentions(&left, pos), mentions(&left, neg));
            let (rp, rn) = (mentions(&right, pos), mentions(&right, neg));
            (lp && !ln && rn && !rp) || (ln && !lp && rp && !rn)
        })
    }

    /// Full comparison: conflict check, structural score, host penalty, threshold.
    pub fn compare(&self, a: &MatchSubject<'_>, b: &MatchSubject<'_>, ctx: &SimilarityContext) -> MatchOutcome {
        if self.has_action_conflict(a.intent, b.intent) {
            return MatchOutcome { score: 0.0, rejection: Some(Rejection::ActionConflict) };
        }
        if a.signature.is_fallback() || b.signature.is_fallback() {
            return MatchOutcome { score: 0.0, rejection: Some(Rejection::NoStructuralSignal) };
        }

        let mut score = self.score(a.signature, b.signature);
        let cross_host = !PageOrigin::parse(a.url).same_host(&PageOrigin::parse(b.url));
        if ctx.operation == OperationKind::CrossEnv && cross_host {
            score = (score - self.cross_env_penalty).max(0.0);
        }

        let rejection = (!self.accepts(score, ctx)).then_some(Rejection::BelowThreshold);
        MatchOutcome { score, rejection }
    }
}

fn tier_weight(tier: Tier) -> f64 {
    match tier {
        Tier::Critical => 3.0,
        Tier::Important => 2.0,
        Tier::Context => 1.0,
    }
}

/// Whether any phrase appears in `tokens` as a contiguous run of whole tokens.
fn mentions(tokens: &[String], phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| {
        let words: Vec<&str> = phrase.split(' ').collect();
        tokens.windows(words.len()).any(|window| window.iter().zip(&words).all(|(t, w)| t.as_str() == *w))
    })
}
