use std::path::PathBuf;

use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, params};

/// Maximum age of a cached feed payload before it is treated as absent.
pub const CACHE_TTL_MS: i64 = 30 * 60 * 1000;

/// The single slot the feed payload lives in.
const SLOT: &str = "all";

/// One cached feed payload with the time it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub payload: String,
    /// Epoch milliseconds of the last successful fetch.
    pub fetched_at: i64,
}

/// The freshness rule: an entry aged exactly the TTL is already stale.
pub fn entry_is_fresh(fetched_at_ms: i64, now_ms: i64) -> bool {
    now_ms - fetched_at_ms < CACHE_TTL_MS
}

/// Time-boxed single-slot persistence for the raw feed payload.
///
/// The store keeps only the database path; every operation opens its own
/// connection, so clones can be moved freely into blocking tasks. Reads
/// never fail: any storage or decoding problem degrades to "absent" and the
/// caller falls through to the network.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Open (or create) the cache database at
    /// `$XDG_CACHE_HOME/circlet/feed.db`.
    pub fn open_default() -> anyhow::Result<Self> {
        let dir = dirs::cache_dir()
            .context("Could not determine cache directory")?
            .join("circlet");

        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;

        Self::open_at(dir.join("feed.db"))
    }

    /// Open (or create) the cache database at an explicit path.
    pub fn open_at(path: PathBuf) -> anyhow::Result<Self> {
        let store = Self { path };
        store
            .connect()
            .with_context(|| format!("Failed to open feed cache: {}", store.path.display()))?;
        Ok(store)
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS feed_cache (
                slot        TEXT PRIMARY KEY,
                payload     TEXT NOT NULL,
                fetched_at  INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(conn)
    }

    /// Return the cached entry, or `None` when no entry exists, the stored
    /// row cannot be read back, or the entry has outlived the TTL.
    pub fn get(&self, now_ms: i64) -> Option<CacheEntry> {
        let conn = self.connect().ok()?;
        let entry = conn
            .query_row(
                "SELECT payload, fetched_at FROM feed_cache WHERE slot = ?1",
                params![SLOT],
                |row| {
                    Ok(CacheEntry {
                        payload: row.get(0)?,
                        fetched_at: row.get(1)?,
                    })
                },
            )
            .optional()
            .ok()??;

        entry_is_fresh(entry.fetched_at, now_ms).then_some(entry)
    }

    /// Overwrite the slot unconditionally, stamping the given time.
    pub fn put(&self, payload: &str, now_ms: i64) -> anyhow::Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO feed_cache (slot, payload, fetched_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(slot) DO UPDATE SET payload = excluded.payload,
                                             fetched_at = excluded.fetched_at",
            params![SLOT, payload, now_ms],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> Store {
        let path = std::env::temp_dir().join(format!("circlet-test-{}-{}.db", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        Store::open_at(path).unwrap()
    }

    #[test]
    fn entry_at_exact_ttl_is_stale() {
        let t = 1_700_000_000_000;
        assert!(entry_is_fresh(t, t));
        assert!(entry_is_fresh(t, t + CACHE_TTL_MS - 1));
        assert!(!entry_is_fresh(t, t + CACHE_TTL_MS));
        assert!(!entry_is_fresh(t, t + 1_800_001));
    }

    #[test]
    fn get_returns_absent_on_empty_store() {
        let store = temp_store("empty");
        assert_eq!(store.get(0), None);
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = temp_store("roundtrip");
        let t = 1_700_000_000_000;
        store.put(r#"{"hello": 1}"#, t).unwrap();

        let entry = store.get(t + 1).unwrap();
        assert_eq!(entry.payload, r#"{"hello": 1}"#);
        assert_eq!(entry.fetched_at, t);
    }

    #[test]
    fn stale_entry_reads_as_absent() {
        let store = temp_store("stale");
        let t = 1_700_000_000_000;
        store.put("payload", t).unwrap();

        assert!(store.get(t + CACHE_TTL_MS - 1).is_some());
        assert_eq!(store.get(t + CACHE_TTL_MS), None);
    }

    #[test]
    fn put_overwrites_the_single_slot() {
        let store = temp_store("overwrite");
        let t = 1_700_000_000_000;
        store.put("first", t).unwrap();
        store.put("second", t + 5).unwrap();

        let entry = store.get(t + 6).unwrap();
        assert_eq!(entry.payload, "second");
        assert_eq!(entry.fetched_at, t + 5);
    }
}
