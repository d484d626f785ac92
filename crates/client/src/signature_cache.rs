//! TTL-bounded memo of page signatures.
//!
//! `generate` never fails: extraction errors produce the fallback sentinel,
//! which is returned but not memoized. Every read re-checks the timestamp,
//! so the background sweep only reclaims memory.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use sigcache_core::cache::{expired_keys, is_expired, now_ms};
use sigcache_core::{Signature, SignatureBuilder};
use tokio::task::JoinHandle;

use crate::extract::{PageSnapshot, extract_elements};

/// A memoized signature.
#[derive(Debug, Clone)]
pub struct CachedSignature {
    pub signature: Signature,
    /// Epoch milliseconds at computation.
    pub timestamp: i64,
    pub url: String,
}

type Entries = Arc<Mutex<HashMap<String, CachedSignature>>>;

/// Signature memo keyed by page identity.
pub struct SignatureCache {
    builder: SignatureBuilder,
    ttl_ms: u64,
    entries: Entries,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl SignatureCache {
    /// Create a cache without a background sweep.
    pub fn new(builder: SignatureBuilder, ttl: Duration) -> Self {
        Self {
            builder,
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            entries: Arc::new(Mutex::new(HashMap::new())),
            sweeper: Mutex::new(None),
        }
    }

    /// Start the background sweep, running once per TTL.
    ///
    /// Does nothing outside a tokio runtime or when already running.
    pub fn start_sweeper(&self) {
        let mut slot = self.sweeper.lock();
        if slot.is_some() {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime; signature sweep disabled");
            return;
        };

        let entries = Arc::downgrade(&self.entries);
        let ttl_ms = self.ttl_ms;
        *slot = Some(handle.spawn(sweep_loop(entries, ttl_ms)));
    }

    pub fn builder(&self) -> &SignatureBuilder {
        &self.builder
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Return the memoized signature for this page, computing it if needed.
    pub async fn generate(&self, page: &PageSnapshot<'_>, url: &str) -> Signature {
        let identity = page.identity(url);
        if let Some(signature) = self.get(&identity) {
            tracing::debug!(url, "signature cache hit");
            return signature;
        }

        let signature = match extract_elements(page).await {
            Ok(elements) => self.builder.build(&elements),
            Err(e) => {
                tracing::warn!(url, error = %e, "extraction failed; using fallback signature");
                return Signature::fallback();
            }
        };

        if !signature.is_fallback() {
            let cached = CachedSignature { signature: signature.clone(), timestamp: now_ms(), url: url.to_string() };
            self.entries.lock().insert(identity, cached);
        }
        tracing::debug!(url, signature = %signature, "signature computed");
        signature
    }

    /// Non-expired signature stored under a page identity.
    pub fn get(&self, identity: &str) -> Option<Signature> {
        let entries = self.entries.lock();
        entries
            .get(identity)
            .filter(|cached| !is_expired(cached.timestamp, now_ms(), self.ttl_ms))
            .map(|cached| cached.signature.clone())
    }

    /// Drop every memoized signature computed for `url`.
    pub fn invalidate(&self, url: &str) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, cached| cached.url != url);
        before - entries.len()
    }

    /// Remove expired signatures now.
    pub fn sweep(&self) -> usize {
        sweep_entries(&self.entries, now_ms(), self.ttl_ms)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Stop the background sweep and clear.
    pub fn close(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
        self.clear();
    }
}

impl Drop for SignatureCache {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}

async fn sweep_loop(entries: Weak<Mutex<HashMap<String, CachedSignature>>>, ttl_ms: u64) {
    let mut interval = tokio::time::interval(Duration::from_millis(ttl_ms.max(1)));
    interval.tick().await;
    loop {
        interval.tick().await;
        let Some(entries) = entries.upgrade() else {
            break;
        };
        let removed = sweep_entries(&entries, now_ms(), ttl_ms);
        if removed > 0 {
            tracing::debug!(removed, "signature sweep");
        }
    }
}

fn sweep_entries(entries: &Mutex<HashMap<String, CachedSignature>>, now: i64, ttl_ms: u64) -> usize {
    let mut entries = entries.lock();
    let expired = expired_keys(entries.iter().map(|(k, v)| (k.as_str(), v.timestamp)), now, ttl_ms);
    for key in &expired {
        entries.remove(key);
    }
    expired.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::testing::StaticEvaluator;
    use sigcache_core::BuilderConfig;

    const URL: &str = "https://app.test/login";
    const PAGE: &str = r#"<button id="login" class="btn">Log in</button>"#;

    fn cache(ttl_ms: u64) -> SignatureCache {
        SignatureCache::new(SignatureBuilder::new(BuilderConfig::default()), Duration::from_millis(ttl_ms))
    }

    #[tokio::test]
    async fn test_generate_memoizes() {
        let cache = cache(60_000);
        let a = cache.generate(&PageSnapshot::Markup(PAGE), URL).await;
        assert!(!a.is_fallback());
        assert_eq!(cache.len(), 1);

        let b = cache.generate(&PageSnapshot::Markup(PAGE), URL).await;
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_different_markup_same_url() {
        let cache = cache(60_000);
        let a = cache.generate(&PageSnapshot::Markup(PAGE), URL).await;
        let b = cache
            .generate(&PageSnapshot::Markup(r#"<button id="login">Log in</button><button>Help</button>"#), URL)
            .await;
        assert_ne!(a, b);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.invalidate(URL), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_failed_extraction_is_fallback_and_not_cached() {
        let cache = cache(60_000);
        let evaluator = StaticEvaluator(Err("detached".into()));
        let sig = cache.generate(&PageSnapshot::Live(&evaluator), URL).await;
        assert!(sig.is_fallback());
        assert_eq!(sig.element_counts, Default::default());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_get_rechecks_ttl_without_sweep() {
        let cache = cache(20);
        let page = PageSnapshot::Markup(PAGE);
        cache.generate(&page, URL).await;
        let identity = page.identity(URL);
        assert!(cache.get(&identity).is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get(&identity).is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.sweep(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_background_sweep() {
        let cache = cache(20);
        cache.start_sweeper();
        cache.generate(&PageSnapshot::Markup(PAGE), URL).await;

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.is_empty());
        cache.close();
    }

    #[tokio::test]
    async fn test_close_clears() {
        let cache = cache(60_000);
        cache.start_sweeper();
        cache.generate(&PageSnapshot::Markup(PAGE), URL).await;
        cache.close();
        assert!(cache.is_empty());
        assert!(cache.sweeper.lock().is_none());
    }
}
