//! Persisted cache entry operations.
//!
//! Signatures are stored as JSON so `empty` segments and element counts
//! survive a round trip; legacy entries store NULL.

use super::connection::CacheDb;
use super::entry::CacheEntry;
use crate::Error;
use crate::signature::Signature;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Row, types::Type};

const SELECT_COLUMNS: &str = "SELECT key, intent, normalized_key, value, url, dom_signature_json,
        created_at, last_accessed, confidence
    FROM cache_entries";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<CacheEntry> {
    let signature_json: Option<String> = row.get(5)?;
    let dom_signature = signature_json
        .map(|json| serde_json::from_str::<Signature>(&json))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(CacheEntry {
        key: row.get(0)?,
        intent: row.get(1)?,
        normalized_key: row.get(2)?,
        value: row.get(3)?,
        url: row.get(4)?,
        dom_signature,
        created_at: row.get(6)?,
        last_accessed: row.get(7)?,
        confidence: row.get(8)?,
    })
}

impl CacheDb {
    /// Insert or update a cache entry.
    ///
    /// Uses UPSERT semantics: inserts if the key doesn't exist,
    /// updates all fields if it does.
    pub async fn upsert_entry(&self, entry: &CacheEntry) -> Result<(), Error> {
        let entry = entry.clone();
        let signature_json = entry.dom_signature.as_ref().map(serde_json::to_string).transpose()?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO cache_entries (
                    key, intent, normalized_key, value, url, dom_signature_json,
                    created_at, last_accessed, confidence
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(key) DO UPDATE SET
                    intent = excluded.intent,
                    normalized_key = excluded.normalized_key,
                    value = excluded.value,
                    url = excluded.url,
                    dom_signature_json = excluded.dom_signature_json,
                    created_at = excluded.created_at,
                    last_accessed = excluded.last_accessed,
                    confidence = excluded.confidence",
                    params![
                        &entry.key,
                        &entry.intent,
                        &entry.normalized_key,
                        &entry.value,
                        &entry.url,
                        &signature_json,
                        entry.created_at,
                        entry.last_accessed,
                        entry.confidence,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by key.
    ///
    /// Returns None if the key doesn't exist.
    pub async fn get_entry(&self, key: &str) -> Result<Option<CacheEntry>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE key = ?1"))?;

                match stmt.query_row(params![key], entry_from_row) {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Load every persisted entry, oldest access first.
    pub async fn load_entries(&self) -> Result<Vec<CacheEntry>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<CacheEntry>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY last_accessed ASC"))?;
                let rows = stmt.query_map([], entry_from_row)?;
                let mut entries = Vec::new();
                for row in rows {
                    entries.push(row?);
                }
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }

    /// Record a hit on `key`. Returns whether a row was updated.
    pub async fn touch_entry(&self, key: &str, last_accessed: i64) -> Result<bool, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "UPDATE cache_entries SET last_accessed = ?2 WHERE key = ?1",
                    params![key, last_accessed],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one entry. Returns whether a row was removed.
    pub async fn delete_entry(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a batch of entries in one transaction.
    ///
    /// Returns the number of deleted entries.
    pub async fn delete_entries(&self, keys: Vec<String>) -> Result<u64, Error> {
        if keys.is_empty() {
            return Ok(0);
        }
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let mut deleted = 0u64;
                {
                    let mut stmt = tx.prepare("DELETE FROM cache_entries WHERE key = ?1")?;
                    for key in &keys {
                        deleted += stmt.execute(params![key])? as u64;
                    }
                }
                tx.commit()?;
                Ok(deleted)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete entries created more than `ttl_ms` before `now_ms`.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired_entries(&self, now_ms: i64, ttl_ms: u64) -> Result<u64, Error> {
        let cutoff = now_ms.saturating_sub(i64::try_from(ttl_ms).unwrap_or(i64::MAX));
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE created_at < ?1", params![cutoff])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry.
    ///
    /// Returns the number of deleted entries.
    pub async fn clear_entries(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM cache_entries", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of persisted entries.
    pub async fn count_entries(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::hash::{compute_cache_key, enhance_cache_key};
    use crate::signature::ElementCounts;

    fn make_test_entry(url: &str, intent: &str, signature: Option<Signature>, created_at: i64) -> CacheEntry {
        let base = compute_cache_key(url, intent);
        CacheEntry {
            key: enhance_cache_key(&base, signature.as_ref()),
            intent: intent.to_string(),
            normalized_key: base,
            value: "#primary-btn".to_string(),
            dom_signature: signature,
            url: url.to_string(),
            created_at,
            last_accessed: created_at,
            confidence: 0.75,
        }
    }

    fn signature() -> Signature {
        Signature::new(
            "0123456789abcdef".into(),
            "empty".into(),
            "fedcba9876543210".into(),
            ElementCounts { critical: 2, important: 0, context: 1 },
        )
    }

    #[tokio::test]
    async fn test_upsert_and_get_round_trip() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entry = make_test_entry("https://app.test/login", "click login", Some(signature()), 1_000);

        db.upsert_entry(&entry).await.unwrap();

        let retrieved = db.get_entry(&entry.key).await.unwrap().unwrap();
        assert_eq!(retrieved, entry);
        assert_eq!(retrieved.dom_signature.unwrap().element_counts.critical, 2);
    }

    #[tokio::test]
    async fn test_legacy_entry_round_trip() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entry = make_test_entry("https://app.test/login", "click login", None, 1_000);
        db.upsert_entry(&entry).await.unwrap();

        let retrieved = db.get_entry(&entry.key).await.unwrap().unwrap();
        assert!(retrieved.is_legacy());
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.get_entry("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mut entry = make_test_entry("https://app.test/", "click", None, 1_000);
        db.upsert_entry(&entry).await.unwrap();

        entry.value = "#other".into();
        entry.last_accessed = 2_000;
        db.upsert_entry(&entry).await.unwrap();

        let retrieved = db.get_entry(&entry.key).await.unwrap().unwrap();
        assert_eq!(retrieved.value, "#other");
        assert_eq!(retrieved.last_accessed, 2_000);
        assert_eq!(db.count_entries().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_load_entries_ordered_by_access() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_entry(&make_test_entry("https://app.test/", "second", None, 2_000))
            .await
            .unwrap();
        db.upsert_entry(&make_test_entry("https://app.test/", "first", None, 1_000))
            .await
            .unwrap();

        let loaded = db.load_entries().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].intent, "first");
        assert_eq!(loaded[1].intent, "second");
    }

    #[tokio::test]
    async fn test_touch_entry_updates_last_accessed() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entry = make_test_entry("https://app.test/", "click", None, 1_000);
        db.upsert_entry(&entry).await.unwrap();

        assert!(db.touch_entry(&entry.key, 5_000).await.unwrap());
        assert!(!db.touch_entry("missing", 5_000).await.unwrap());

        let retrieved = db.get_entry(&entry.key).await.unwrap().unwrap();
        assert_eq!(retrieved.last_accessed, 5_000);
        assert_eq!(retrieved.created_at, 1_000);
    }

    #[tokio::test]
    async fn test_delete_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let a = make_test_entry("https://app.test/", "a", None, 1_000);
        let b = make_test_entry("https://app.test/", "b", None, 1_000);
        let c = make_test_entry("https://app.test/", "c", None, 1_000);
        for e in [&a, &b, &c] {
            db.upsert_entry(e).await.unwrap();
        }

        assert!(db.delete_entry(&a.key).await.unwrap());
        assert!(!db.delete_entry(&a.key).await.unwrap());

        let deleted = db.delete_entries(vec![b.key.clone(), "missing".into()]).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(db.count_entries().await.unwrap(), 1);
        assert_eq!(db.delete_entries(Vec::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_expired_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_entry(&make_test_entry("https://app.test/", "old", None, 1_000))
            .await
            .unwrap();
        db.upsert_entry(&make_test_entry("https://app.test/", "new", None, 9_000))
            .await
            .unwrap();

        let deleted = db.purge_expired_entries(10_000, 5_000).await.unwrap();
        assert_eq!(deleted, 1);

        let remaining = db.load_entries().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].intent, "new");
    }

    #[tokio::test]
    async fn test_clear_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_entry(&make_test_entry("https://app.test/", "a", None, 1_000))
            .await
            .unwrap();
        assert_eq!(db.clear_entries().await.unwrap(), 1);
        assert_eq!(db.count_entries().await.unwrap(), 0);
    }
}
