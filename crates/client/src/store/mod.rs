//! Bidirectional intent/locator store.
//!
//! ### Lookup
//! Each step short-circuits on success:
//! 1. **Exact**: key of the raw intent on this url, bound to the page signature,
//!    then the unbound key that legacy entries are stored under.
//! 2. **Normalized**: same two keys, after intent normalization.
//! 3. **Fuzzy**: signatures of entries on the same logical page are scored
//!    against the current one; conflicting actions and unrelated intents are
//!    skipped and the best accepted score wins.
//!
//! ### Eviction
//! Entries expire `selector_ttl` after creation and the least recently used
//! are evicted when over the byte budget. Expiry is checked on every read;
//! the background cleanup only reclaims memory.
//!
//! ### Persistence
//! With a [`CacheDb`], every mutation is written through and non-expired
//! rows are loaded on [`BidirectionalStore::open`].

pub mod metrics;
mod state;

pub use metrics::{HitCounts, MetricsSnapshot, StoreMetrics};

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use sigcache_core::cache::{compute_cache_key, enhance_cache_key, now_ms};
use sigcache_core::intent::{intent_similarity, normalize_intent};
use sigcache_core::similarity::{MatchSubject, PageOrigin};
use sigcache_core::{AppConfig, CacheDb, CacheEntry, Error, OperationKind, Signature, SimilarityContext, SimilarityEngine};
use tokio::task::JoinHandle;

use crate::extract::PageSnapshot;
use crate::signature_cache::SignatureCache;
use state::StoreState;

/// Store tuning, usually projected from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub selector_ttl: Duration,
    pub cleanup_interval: Duration,
    pub max_size_bytes: usize,
    /// Minimum intent likeness for a fuzzy candidate.
    pub min_intent_similarity: f64,
    /// Consider same-path entries recorded on other hosts.
    pub cross_env_enabled: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for StoreConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            selector_ttl: config.selector_ttl(),
            cleanup_interval: config.cleanup_interval(),
            max_size_bytes: config.max_size_bytes(),
            min_intent_similarity: config.min_intent_similarity,
            cross_env_enabled: config.cross_env_enabled,
        }
    }
}

impl StoreConfig {
    fn ttl_ms(&self) -> u64 {
        u64::try_from(self.selector_ttl.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Which lookup step produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LookupSource {
    Exact,
    Normalized,
    Fuzzy,
}

impl LookupSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Normalized => "normalized",
            Self::Fuzzy => "fuzzy",
        }
    }
}

/// A successful lookup.
#[derive(Debug, Clone, PartialEq, Serialize, schemars::JsonSchema)]
pub struct LookupResult {
    pub locator: String,
    pub source: LookupSource,
    /// 1.0 for key matches, the structural score for fuzzy hits.
    pub confidence: f64,
    /// Key of the entry that answered.
    pub key: String,
}

/// Intent/locator cache bound to page structure.
pub struct BidirectionalStore {
    config: StoreConfig,
    signatures: Arc<SignatureCache>,
    engine: SimilarityEngine,
    state: Arc<Mutex<StoreState>>,
    metrics: Arc<StoreMetrics>,
    db: Option<CacheDb>,
    cleaner: Mutex<Option<JoinHandle<()>>>,
}

impl BidirectionalStore {
    /// In-memory store.
    pub fn new(config: StoreConfig, signatures: Arc<SignatureCache>, engine: SimilarityEngine) -> Self {
        Self {
            config,
            signatures,
            engine,
            state: Arc::new(Mutex::new(StoreState::new())),
            metrics: Arc::new(StoreMetrics::default()),
            db: None,
            cleaner: Mutex::new(None),
        }
    }

    /// Store backed by `db`, hydrated with its non-expired rows.
    ///
    /// Expired rows are deleted while loading.
    pub async fn open(
        config: StoreConfig, signatures: Arc<SignatureCache>, engine: SimilarityEngine, db: CacheDb,
    ) -> Result<Self, Error> {
        let ttl_ms = config.ttl_ms();
        let now = now_ms();
        let purged = db.purge_expired_entries(now, ttl_ms).await?;
        let rows = db.load_entries().await?;

        let mut store = Self::new(config, signatures, engine);
        let evicted = {
            let mut state = store.state.lock();
            for entry in rows {
                state.insert(entry);
            }
            state.evict_over(store.config.max_size_bytes)
        };
        db.delete_entries(evicted).await?;

        tracing::info!(entries = store.len(), purged, "store hydrated");
        store.db = Some(db);
        Ok(store)
    }

    /// Start the periodic cleanup on `cleanup_interval`.
    ///
    /// Does nothing outside a tokio runtime or when already running.
    pub fn start_cleanup(&self) {
        let mut slot = self.cleaner.lock();
        if slot.is_some() {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime; store cleanup disabled");
            return;
        };

        let task = CleanupTask {
            state: Arc::downgrade(&self.state),
            metrics: Arc::downgrade(&self.metrics),
            db: self.db.clone(),
            ttl_ms: self.config.ttl_ms(),
            every: self.config.cleanup_interval,
        };
        *slot = Some(handle.spawn(task.run()));
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn signatures(&self) -> &Arc<SignatureCache> {
        &self.signatures
    }

    pub fn engine(&self) -> &SimilarityEngine {
        &self.engine
    }

    /// Record that `intent` on `url` resolved to `locator`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a blank intent or locator; persistence failures.
    pub async fn set(&self, intent: &str, url: &str, locator: &str, page: &PageSnapshot<'_>) -> Result<CacheEntry, Error> {
        validate(intent, locator)?;
        let signature = self.signatures.generate(page, url).await;
        let now = now_ms();
        let entry = build_entry(intent, url, locator, Some(&signature), now, now, 1.0);
        self.insert(entry).await
    }

    /// Insert a signature-less entry in the legacy key format.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a blank intent or locator; persistence failures.
    pub async fn import_legacy(&self, intent: &str, url: &str, locator: &str) -> Result<CacheEntry, Error> {
        validate(intent, locator)?;
        let now = now_ms();
        let entry = build_entry(intent, url, locator, None, now, now, 1.0);
        self.insert(entry).await
    }

    async fn insert(&self, entry: CacheEntry) -> Result<CacheEntry, Error> {
        let evicted = {
            let mut state = self.state.lock();
            state.insert(entry.clone());
            state.evict_over(self.config.max_size_bytes)
        };
        self.metrics.record_set();
        if !evicted.is_empty() {
            tracing::debug!(evicted = evicted.len(), "evicted least recently used entries");
            self.metrics.record_evictions(evicted.len());
        }

        if let Some(db) = &self.db {
            db.upsert_entry(&entry).await?;
            db.delete_entries(evicted).await?;
        }
        tracing::debug!(url = %entry.url, legacy = entry.is_legacy(), "entry stored");
        Ok(entry)
    }

    /// Resolve `intent` on `url` to a locator.
    pub async fn get(&self, intent: &str, url: &str, page: &PageSnapshot<'_>) -> Option<LookupResult> {
        let signature = self.signatures.generate(page, url).await;
        let now = now_ms();
        let ttl_ms = self.config.ttl_ms();
        let usable = (!signature.is_fallback()).then_some(&signature);

        let exact_base = compute_cache_key(url, intent.trim());
        let normalized_base = compute_cache_key(url, &normalize_intent(intent));
        let exact_keys = lookup_keys(&exact_base, usable);
        let normalized_keys = lookup_keys(&normalized_base, usable);

        let mut expired = Vec::new();
        let result = {
            let mut state = self.state.lock();
            if let Some(entry) = exact_keys.iter().find_map(|key| touch(&mut state, key, now, ttl_ms, &mut expired)) {
                Some(hit(entry, LookupSource::Exact, 1.0))
            } else if let Some(entry) = normalized_keys.iter().find_map(|key| {
                let target = state.normalized_target(key)?;
                touch(&mut state, &target, now, ttl_ms, &mut expired)
            }) {
                Some(hit(entry, LookupSource::Normalized, 1.0))
            } else if let Some(subject) = usable.map(|signature| MatchSubject { intent, signature, url })
                && let Some((key, score)) = self.best_fuzzy(&state, &subject, now, ttl_ms)
                && let Some(entry) = touch(&mut state, &key, now, ttl_ms, &mut expired)
            {
                Some(hit(entry, LookupSource::Fuzzy, score))
            } else {
                None
            }
        };

        if let Some(found) = &result
            && let Some(db) = &self.db
            && let Err(e) = db.touch_entry(&found.key, now).await
        {
            tracing::warn!("failed to persist access time: {e}");
        }

        if !expired.is_empty() {
            self.metrics.record_expirations(expired.len());
            self.delete_persisted(expired).await;
        }

        match &result {
            Some(found) => {
                self.metrics.record_hit(found.source);
                tracing::debug!(url, source = found.source.as_str(), score = found.confidence, "cache hit");
            }
            None => {
                self.metrics.record_miss();
                tracing::debug!(url, "cache miss");
            }
        }
        result
    }

    fn best_fuzzy(&self, state: &StoreState, subject: &MatchSubject<'_>, now: i64, ttl_ms: u64) -> Option<(String, f64)> {
        let origin = PageOrigin::parse(subject.url);
        let mut best: Option<(String, f64, f64)> = None;

        for (key, entry) in state.entries.iter() {
            let Some(signature) = entry.dom_signature.as_ref() else {
                continue;
            };
            if entry.is_expired(now, ttl_ms) {
                continue;
            }

            let entry_origin = PageOrigin::parse(&entry.url);
            if !entry_origin.same_path(&origin) {
                continue;
            }
            let operation = if entry_origin.same_host(&origin) {
                OperationKind::CacheLookup
            } else if self.config.cross_env_enabled {
                OperationKind::CrossEnv
            } else {
                continue;
            };

            let likeness = intent_similarity(subject.intent, &entry.intent);
            if likeness < self.config.min_intent_similarity {
                continue;
            }

            let candidate = MatchSubject { intent: &entry.intent, signature, url: &entry.url };
            let outcome = self.engine.compare(subject, &candidate, &SimilarityContext::new(operation));
            if let Some(rejection) = outcome.rejection {
                tracing::trace!(?rejection, score = outcome.score, "fuzzy candidate rejected");
                continue;
            }

            let better = match &best {
                None => true,
                Some((_, score, like)) => outcome.score > *score || (outcome.score == *score && likeness > *like),
            };
            if better {
                best = Some((key.clone(), outcome.score, likeness));
            }
        }

        best.map(|(key, score, _)| (key, score))
    }

    /// Intent recorded for `locator` on `url`, if still live.
    pub fn get_text_for(&self, locator: &str, url: &str) -> Option<String> {
        let state = self.state.lock();
        let key = state.reverse_target(url, locator)?;
        state
            .entries
            .peek(&key)
            .filter(|entry| !entry.is_expired(now_ms(), self.config.ttl_ms()))
            .map(|entry| entry.intent.clone())
    }

    /// Compose a base key with the page's current signature.
    pub async fn create_enhanced_cache_key(&self, base_key: &str, page: &PageSnapshot<'_>, url: &str) -> String {
        let signature = self.signatures.generate(page, url).await;
        enhance_cache_key(base_key, Some(&signature))
    }

    /// Remove expired entries now.
    pub async fn purge_expired(&self) -> Result<usize, Error> {
        let removed = self.state.lock().purge_expired(now_ms(), self.config.ttl_ms());
        let count = removed.len();
        self.metrics.record_expirations(count);
        if let Some(db) = &self.db {
            db.delete_entries(removed).await?;
        }
        Ok(count)
    }

    /// Remove every entry, including persisted rows.
    pub async fn clear(&self) -> Result<usize, Error> {
        let count = {
            let mut state = self.state.lock();
            let count = state.len();
            state.clear();
            count
        };
        if let Some(db) = &self.db {
            db.clear_entries().await?;
        }
        Ok(count)
    }

    /// Stop background cleanup and drop in-memory entries.
    ///
    /// Persisted rows are kept.
    pub fn close(&self) {
        if let Some(handle) = self.cleaner.lock().take() {
            handle.abort();
        }
        self.state.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn legacy_count(&self) -> usize {
        let state = self.state.lock();
        state.len() - state.signed_len()
    }

    /// Legacy entries recorded for `url`.
    pub fn legacy_for(&self, url: &str) -> usize {
        self.state.lock().entries.iter().filter(|(_, e)| e.is_legacy() && e.url == url).count()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        let state = self.state.lock();
        self.metrics.snapshot(state.len(), state.signed_len(), state.bytes())
    }

    /// Re-key the legacy entries of `url` under `signature`.
    ///
    /// Returns `(old_key, new_entry)` pairs; persistence is the caller's.
    pub(crate) fn rekey_legacy(&self, url: &str, signature: &Signature) -> Vec<(String, CacheEntry)> {
        let mut state = self.state.lock();
        let legacy: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, e)| e.is_legacy() && e.url == url)
            .map(|(k, _)| k.clone())
            .collect();

        let mut moved = Vec::with_capacity(legacy.len());
        for old_key in legacy {
            let Some(old) = state.remove(&old_key) else {
                continue;
            };
            let entry = build_entry(
                &old.intent,
                &old.url,
                &old.value,
                Some(signature),
                old.created_at,
                old.last_accessed,
                old.confidence,
            );
            state.insert(entry.clone());
            moved.push((old_key, entry));
        }
        moved
    }

    pub(crate) fn db(&self) -> Option<&CacheDb> {
        self.db.as_ref()
    }

    async fn delete_persisted(&self, keys: Vec<String>) {
        if let Some(db) = &self.db
            && let Err(e) = db.delete_entries(keys).await
        {
            tracing::warn!("failed to delete expired rows: {e}");
        }
    }
}

impl Drop for BidirectionalStore {
    fn drop(&mut self) {
        if let Some(handle) = self.cleaner.get_mut().take() {
            handle.abort();
        }
    }
}

fn validate(intent: &str, locator: &str) -> Result<(), Error> {
    if intent.trim().is_empty() {
        return Err(Error::InvalidInput("intent must not be blank".into()));
    }
    if locator.trim().is_empty() {
        return Err(Error::InvalidInput("locator must not be blank".into()));
    }
    Ok(())
}

/// Build an entry keyed for `signature`; fallback or absent signatures give a legacy entry.
fn build_entry(
    intent: &str, url: &str, locator: &str, signature: Option<&Signature>, created_at: i64, last_accessed: i64,
    confidence: f64,
) -> CacheEntry {
    let signature = signature.filter(|s| !s.is_fallback());
    let intent = intent.trim();
    CacheEntry {
        key: enhance_cache_key(&compute_cache_key(url, intent), signature),
        intent: intent.to_string(),
        normalized_key: enhance_cache_key(&compute_cache_key(url, &normalize_intent(intent)), signature),
        value: locator.to_string(),
        dom_signature: signature.cloned(),
        url: url.to_string(),
        created_at,
        last_accessed,
        confidence,
    }
}

/// Signature-bound key first, then the plain key legacy entries are stored under.
fn lookup_keys(base: &str, signature: Option<&Signature>) -> Vec<String> {
    match signature {
        Some(signature) => vec![enhance_cache_key(base, Some(signature)), base.to_string()],
        None => vec![base.to_string()],
    }
}

/// Fetch a live entry as most recently used, recording it as expired otherwise.
fn touch(state: &mut StoreState, key: &str, now: i64, ttl_ms: u64, expired: &mut Vec<String>) -> Option<CacheEntry> {
    let is_expired = state.entries.peek(key)?.is_expired(now, ttl_ms);
    if is_expired {
        state.remove(key);
        expired.push(key.to_string());
        return None;
    }
    let entry = state.entries.get_mut(key)?;
    entry.last_accessed = now;
    Some(entry.clone())
}

fn hit(entry: CacheEntry, source: LookupSource, confidence: f64) -> LookupResult {
    LookupResult { locator: entry.value, source, confidence, key: entry.key }
}

struct CleanupTask {
    state: Weak<Mutex<StoreState>>,
    metrics: Weak<StoreMetrics>,
    db: Option<CacheDb>,
    ttl_ms: u64,
    every: Duration,
}

impl CleanupTask {
    async fn run(self) {
        let mut interval = tokio::time::interval(self.every.max(Duration::from_millis(1)));
        interval.tick().await;
        loop {
            interval.tick().await;
            let (Some(state), Some(metrics)) = (self.state.upgrade(), self.metrics.upgrade()) else {
                break;
            };
            let removed = state.lock().purge_expired(now_ms(), self.ttl_ms);
            drop(state);
            if removed.is_empty() {
                continue;
            }

            metrics.record_expirations(removed.len());
            tracing::debug!(removed = removed.len(), "store cleanup");
            if let Some(db) = &self.db
                && let Err(e) = db.delete_entries(removed).await
            {
                tracing::warn!("cleanup failed to delete rows: {e}");
            }
        }
    }
}
