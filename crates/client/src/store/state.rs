//! Maps owned by one store: the LRU of entries plus its two indices.

use std::collections::HashMap;

use lru::LruCache;
use sigcache_core::CacheEntry;
use sigcache_core::cache::expired_keys;

/// Entries plus the normalized and reverse indices.
///
/// Every mutation goes through `insert`, `remove` or `evict_over` so the
/// indices and byte count never drift from the LRU. An index slot lists
/// every live key sharing it, newest last.
pub(crate) struct StoreState {
    pub(crate) entries: LruCache<String, CacheEntry>,
    normalized: HashMap<String, Vec<String>>,
    reverse: HashMap<String, Vec<String>>,
    bytes: usize,
}

fn reverse_key(url: &str, locator: &str) -> String {
    format!("{url}\n{locator}")
}

impl StoreState {
    pub(crate) fn new() -> Self {
        Self { entries: LruCache::unbounded(), normalized: HashMap::new(), reverse: HashMap::new(), bytes: 0 }
    }

    pub(crate) fn bytes(&self) -> usize {
        self.bytes
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn signed_len(&self) -> usize {
        self.entries.iter().filter(|(_, e)| !e.is_legacy()).count()
    }

    /// Insert as most recently used, replacing any entry under the same key.
    pub(crate) fn insert(&mut self, entry: CacheEntry) {
        self.remove(&entry.key);
        self.bytes += entry.approximate_size();
        self.normalized.entry(entry.normalized_key.clone()).or_default().push(entry.key.clone());
        self.reverse.entry(reverse_key(&entry.url, &entry.value)).or_default().push(entry.key.clone());
        self.entries.put(entry.key.clone(), entry);
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.pop(key)?;
        self.forget(&entry);
        Some(entry)
    }

    /// Evict least recently used entries until within `max_bytes`.
    ///
    /// The most recent entry is always kept, even if it alone is over budget.
    pub(crate) fn evict_over(&mut self, max_bytes: usize) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.bytes > max_bytes
            && self.entries.len() > 1
            && let Some((key, entry)) = self.entries.pop_lru()
        {
            self.forget(&entry);
            evicted.push(key);
        }
        evicted
    }

    /// Remove entries older than `ttl_ms`, returning their keys.
    pub(crate) fn purge_expired(&mut self, now_ms: i64, ttl_ms: u64) -> Vec<String> {
        let expired = expired_keys(self.entries.iter().map(|(k, e)| (k.as_str(), e.created_at)), now_ms, ttl_ms);
        for key in &expired {
            self.remove(key);
        }
        expired
    }

    pub(crate) fn normalized_target(&self, normalized_key: &str) -> Option<String> {
        self.normalized.get(normalized_key)?.last().cloned()
    }

    pub(crate) fn reverse_target(&self, url: &str, locator: &str) -> Option<String> {
        self.reverse.get(&reverse_key(url, locator))?.last().cloned()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.normalized.clear();
        self.reverse.clear();
        self.bytes = 0;
    }

    fn forget(&mut self, entry: &CacheEntry) {
        self.bytes = self.bytes.saturating_sub(entry.approximate_size());
        unlink(&mut self.normalized, &entry.normalized_key, &entry.key);
        unlink(&mut self.reverse, &reverse_key(&entry.url, &entry.value), &entry.key);
    }
}

fn unlink(index: &mut HashMap<String, Vec<String>>, slot: &str, key: &str) {
    if let Some(keys) = index.get_mut(slot) {
        keys.retain(|k| k != key);
        if keys.is_empty() {
            index.remove(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, value: &str, created_at: i64) -> CacheEntry {
        CacheEntry {
            key: key.into(),
            intent: format!("intent {key}"),
            normalized_key: format!("n-{key}"),
            value: value.into(),
            dom_signature: None,
            url: "https://app.test/".into(),
            created_at,
            last_accessed: created_at,
            confidence: 1.0,
        }
    }

    #[test]
    fn test_insert_and_indices() {
        let mut state = StoreState::new();
        state.insert(entry("a", "#a", 0));
        assert_eq!(state.len(), 1);
        assert_eq!(state.normalized_target("n-a").as_deref(), Some("a"));
        assert_eq!(state.reverse_target("https://app.test/", "#a").as_deref(), Some("a"));

        state.remove("a");
        assert_eq!(state.len(), 0);
        assert_eq!(state.bytes(), 0);
        assert!(state.normalized_target("n-a").is_none());
        assert!(state.reverse_target("https://app.test/", "#a").is_none());
    }

    #[test]
    fn test_replace_keeps_byte_count() {
        let mut state = StoreState::new();
        state.insert(entry("a", "#a", 0));
        let once = state.bytes();
        state.insert(entry("a", "#a", 5));
        assert_eq!(state.bytes(), once);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_shared_reverse_index_survives_older_removal() {
        let mut state = StoreState::new();
        state.insert(entry("a", "#same", 0));
        state.insert(entry("b", "#same", 0));
        state.remove("a");
        assert_eq!(state.reverse_target("https://app.test/", "#same").as_deref(), Some("b"));
    }

    #[test]
    fn test_shared_slots_survive_newer_removal() {
        let mut state = StoreState::new();
        let mut older = entry("a", "#same", 0);
        older.normalized_key = "n-shared".into();
        let mut newer = entry("b", "#same", 0);
        newer.normalized_key = "n-shared".into();
        state.insert(older);
        state.insert(newer);
        assert_eq!(state.normalized_target("n-shared").as_deref(), Some("b"));

        state.remove("b");
        assert_eq!(state.reverse_target("https://app.test/", "#same").as_deref(), Some("a"));
        assert_eq!(state.normalized_target("n-shared").as_deref(), Some("a"));

        state.remove("a");
        assert!(state.reverse_target("https://app.test/", "#same").is_none());
        assert!(state.normalized_target("n-shared").is_none());
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut state = StoreState::new();
        state.insert(entry("a", "#a", 0));
        state.insert(entry("b", "#b", 0));
        state.insert(entry("c", "#c", 0));
        state.entries.get("a");

        let per_entry = state.bytes() / 3;
        let evicted = state.evict_over(per_entry * 2);
        assert_eq!(evicted, vec!["b".to_string()]);
        assert!(state.entries.contains("a"));
        assert!(state.entries.contains("c"));
    }

    #[test]
    fn test_newest_entry_kept_when_over_budget() {
        let mut state = StoreState::new();
        state.insert(entry("a", "#a", 0));
        assert!(state.evict_over(1).is_empty());
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_purge_expired() {
        let mut state = StoreState::new();
        state.insert(entry("old", "#o", 0));
        state.insert(entry("new", "#n", 9_000));
        let purged = state.purge_expired(10_000, 5_000);
        assert_eq!(purged, vec!["old".to_string()]);
        assert_eq!(state.len(), 1);
    }
}
