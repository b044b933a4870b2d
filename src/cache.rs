use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::types::PaperRecord;

/// Cached search results older than this are refetched.
const MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// SQLite-backed cache of literature search results keyed by source and query.
pub struct SearchCache {
    conn: Connection,
}

impl SearchCache {
    /// Open the cache under the user's cache directory.
    pub fn open_default() -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .context("Could not determine cache directory")?
            .join("paperscan");
        std::fs::create_dir_all(&cache_dir)?;
        Self::open(&cache_dir.join("search_cache.db"))
    }

    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open search cache: {}", path.display()))?;
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS search_cache (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )?;
        Ok(Self { conn })
    }

    pub fn key(source: &str, query: &str) -> String {
        format!("{source}|{}", query.to_lowercase())
    }

    /// None = not cached or expired.
    pub fn get(&self, key: &str) -> Result<Option<Vec<PaperRecord>>> {
        self.get_at(key, now_secs())
    }

    fn get_at(&self, key: &str, now: i64) -> Result<Option<Vec<PaperRecord>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload, created_at FROM search_cache WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let created_at: i64 = row.get(1)?;
        if now - created_at > MAX_AGE_SECS {
            return Ok(None);
        }
        let payload: String = row.get(0)?;
        let records = serde_json::from_str(&payload)
            .with_context(|| format!("Corrupt cache entry for {key}"))?;
        Ok(Some(records))
    }

    pub fn put(&self, key: &str, records: &[PaperRecord]) -> Result<()> {
        self.put_at(key, records, now_secs())
    }

    fn put_at(&self, key: &str, records: &[PaperRecord], now: i64) -> Result<()> {
        let payload = serde_json::to_string(records)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO search_cache (key, payload, created_at) VALUES (?1, ?2, ?3)",
            params![key, payload, now],
        )?;
        Ok(())
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> PaperRecord {
        PaperRecord {
            title: title.to_string(),
            authors: vec!["Ada Lovelace".into()],
            year: Some(1843),
            url: Some(format!("https://example.org/{title}")),
            abstract_text: None,
            source: "arXiv".into(),
        }
    }

    #[test]
    fn miss_then_hit() {
        let cache = SearchCache::in_memory().unwrap();
        let key = SearchCache::key("arXiv", "Graphs");
        assert_eq!(cache.get(&key).unwrap(), None);
        cache.put(&key, &[record("engines")]).unwrap();
        assert_eq!(cache.get(&key).unwrap(), Some(vec![record("engines")]));
    }

    #[test]
    fn empty_result_is_cached() {
        let cache = SearchCache::in_memory().unwrap();
        cache.put("s|q", &[]).unwrap();
        assert_eq!(cache.get("s|q").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn expired_entries_are_misses() {
        let cache = SearchCache::in_memory().unwrap();
        cache.put_at("s|q", &[record("old")], 1_000).unwrap();
        assert!(cache.get_at("s|q", 1_000 + MAX_AGE_SECS).unwrap().is_some());
        assert_eq!(cache.get_at("s|q", 1_001 + MAX_AGE_SECS).unwrap(), None);
    }

    #[test]
    fn keys_ignore_query_case() {
        assert_eq!(SearchCache::key("arXiv", "GNN"), SearchCache::key("arXiv", "gnn"));
        assert_ne!(SearchCache::key("arXiv", "gnn"), SearchCache::key("Semantic Scholar", "gnn"));
    }
}
