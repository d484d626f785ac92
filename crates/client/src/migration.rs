//! Upgrade of signature-less entries.

use serde::Serialize;
use sigcache_core::Error;

use crate::extract::PageSnapshot;
use crate::store::BidirectionalStore;

/// Outcome of migrating one URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct MigrationReport {
    /// Entries re-keyed under the page signature.
    pub migrated: usize,
    /// Legacy entries of this URL left as they were because the page gave no signal.
    pub skipped: usize,
    /// Legacy entries left in the whole store.
    pub remaining: usize,
}

/// Re-keys legacy entries of a store against fresh page snapshots.
pub struct MigrationAdapter<'a> {
    store: &'a BidirectionalStore,
}

impl<'a> MigrationAdapter<'a> {
    pub fn new(store: &'a BidirectionalStore) -> Self {
        Self { store }
    }

    /// Whether any legacy entry is present.
    pub fn is_migration_needed(&self) -> bool {
        self.store.legacy_count() > 0
    }

    /// Attach the signature of `page` to every legacy entry recorded for `url`.
    ///
    /// Running it again is a no-op: migrated entries are no longer legacy.
    ///
    /// # Errors
    ///
    /// Persistence failures only.
    pub async fn migrate(&self, url: &str, page: &PageSnapshot<'_>) -> Result<MigrationReport, Error> {
        let signature = self.store.signatures().generate(page, url).await;
        if signature.is_fallback() {
            let skipped = self.store.legacy_for(url);
            tracing::warn!(url, skipped, "no structural signal; legacy entries left as is");
            return Ok(MigrationReport { migrated: 0, skipped, remaining: self.store.legacy_count() });
        }

        let moved = self.store.rekey_legacy(url, &signature);
        if let Some(db) = self.store.db() {
            for (_, entry) in &moved {
                db.upsert_entry(entry).await?;
            }
            db.delete_entries(moved.iter().map(|(old_key, _)| old_key.clone()).collect()).await?;
        }

        let report = MigrationReport { migrated: moved.len(), skipped: 0, remaining: self.store.legacy_count() };
        tracing::info!(url, migrated = report.migrated, remaining = report.remaining, "legacy entries migrated");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::testing::StaticEvaluator;
    use crate::signature_cache::SignatureCache;
    use crate::store::{LookupSource, StoreConfig};
    use sigcache_core::cache::compute_cache_key;
    use sigcache_core::{BuilderConfig, CacheDb, SignatureBuilder, SimilarityEngine};
    use std::sync::Arc;
    use std::time::Duration;

    const URL: &str = "https://app.test/login";
    const PAGE: &str = r#"<form><input name="user"><button id="login" class="btn">Log in</button></form>"#;

    fn signatures() -> Arc<SignatureCache> {
        Arc::new(SignatureCache::new(SignatureBuilder::new(BuilderConfig::default()), Duration::from_secs(60)))
    }

    fn store() -> BidirectionalStore {
        BidirectionalStore::new(StoreConfig::default(), signatures(), SimilarityEngine::default())
    }

    #[tokio::test]
    async fn test_migration_needed_only_with_legacy_entries() {
        let store = store();
        let adapter = MigrationAdapter::new(&store);
        assert!(!adapter.is_migration_needed());

        store.set("click login", URL, "#login", &PageSnapshot::Markup(PAGE)).await.unwrap();
        assert!(!adapter.is_migration_needed());

        store.import_legacy("type user", URL, "input[name=user]").await.unwrap();
        assert!(adapter.is_migration_needed());
    }

    #[tokio::test]
    async fn test_migrate_rekeys_under_signature() {
        let store = store();
        let legacy = store.import_legacy("click login", URL, "#login").await.unwrap();
        store.import_legacy("click elsewhere", "https://app.test/other", "#x").await.unwrap();

        let adapter = MigrationAdapter::new(&store);
        let report = adapter.migrate(URL, &PageSnapshot::Markup(PAGE)).await.unwrap();
        assert_eq!(report, MigrationReport { migrated: 1, skipped: 0, remaining: 1 });

        let found = store.get("click login", URL, &PageSnapshot::Markup(PAGE)).await.unwrap();
        assert_eq!(found.source, LookupSource::Exact);
        assert_ne!(found.key, legacy.key);

        let base = compute_cache_key(URL, "click login");
        let expected = store.create_enhanced_cache_key(&base, &PageSnapshot::Markup(PAGE), URL).await;
        assert_eq!(found.key, expected);
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let store = store();
        store.import_legacy("click login", URL, "#login").await.unwrap();
        let adapter = MigrationAdapter::new(&store);

        adapter.migrate(URL, &PageSnapshot::Markup(PAGE)).await.unwrap();
        let before = store.metrics();
        let again = adapter.migrate(URL, &PageSnapshot::Markup(PAGE)).await.unwrap();

        assert_eq!(again, MigrationReport::default());
        assert_eq!(store.metrics().entries, before.entries);
        assert!(!adapter.is_migration_needed());
    }

    #[tokio::test]
    async fn test_fallback_page_skips() {
        let store = store();
        store.import_legacy("click login", URL, "#login").await.unwrap();
        let broken = StaticEvaluator(Err("detached".into()));

        let report = MigrationAdapter::new(&store).migrate(URL, &PageSnapshot::Live(&broken)).await.unwrap();
        assert_eq!(report, MigrationReport { migrated: 0, skipped: 1, remaining: 1 });
    }

    #[tokio::test]
    async fn test_migration_is_persisted() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = BidirectionalStore::open(StoreConfig::default(), signatures(), SimilarityEngine::default(), db)
            .await
            .unwrap();
        let legacy = store.import_legacy("click login", URL, "#login").await.unwrap();

        MigrationAdapter::new(&store).migrate(URL, &PageSnapshot::Markup(PAGE)).await.unwrap();

        let db = store.db().unwrap();
        assert!(db.get_entry(&legacy.key).await.unwrap().is_none());
        let rows = db.load_entries().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_legacy());
        assert_eq!(rows[0].created_at, legacy.created_at);
    }
}
