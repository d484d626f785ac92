//! Versioned schema migrations.
//!
//! Applied versions are recorded in `_migrations`; each pending migration
//! runs in its own transaction together with its bookkeeping row.

use super::Error;
use tokio_rusqlite::{Connection, params};

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Ordered by version.
const MIGRATIONS: &[Migration] = &[
    Migration { version: 1, name: "cache_entries", sql: include_str!("../../migrations/001_cache_entries.sql") },
    Migration { version: 2, name: "entry_indexes", sql: include_str!("../../migrations/002_entry_indexes.sql") },
];

/// Apply every migration newer than the recorded version.
///
/// # Errors
///
/// `MigrationFailed` naming the migration whose SQL failed.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            )",
        )?;

        let current: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            tracing::debug!(version = migration.version, name = migration.name, "applying schema migration");
            let tx = conn.transaction()?;
            tx.execute_batch(migration.sql)
                .map_err(|e| Error::MigrationFailed(format!("{} {}: {e}", migration.version, migration.name)))?;
            tx.execute(
                "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                params![migration.version, migration.name, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn count(conn: &Connection, sql: &'static str) -> i64 {
        conn.call(move |conn| conn.query_row(sql, [], |row| row.get(0)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_rerun_is_noop() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        let tables = count(
            &conn,
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='cache_entries'",
        )
        .await;
        assert_eq!(tables, 1);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM _migrations").await, MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn test_versions_are_named() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();

        let names: Vec<String> = conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT name FROM _migrations ORDER BY version")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect::<Result<Vec<String>, _>>()
            })
            .await
            .unwrap();
        assert_eq!(names, vec!["cache_entries", "entry_indexes"]);
    }

    #[tokio::test]
    async fn test_indexes_created() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();

        let indexes = count(
            &conn,
            "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name LIKE 'idx_cache_entries_%'",
        )
        .await;
        assert_eq!(indexes, 3);
    }

    #[test]
    fn test_versions_ascending() {
        assert!(MIGRATIONS.windows(2).all(|w| w[0].version < w[1].version));
    }
}
