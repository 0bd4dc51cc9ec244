//! Key/value store implementations

use crate::error::{Result, ShareError};
use crate::traits::KeyValueStore;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Process-local store, dropped with the session
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| ShareError::Storage("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<Option<String>>,
    ) -> Result<()> {
        let mut entries = self.entries()?;
        match apply(entries.get(key).cloned())? {
            Some(value) => entries.insert(key.to_string(), value),
            None => entries.remove(key),
        };
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .entries()?
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

#[cfg(feature = "native")]
pub use native::SqliteStore;

#[cfg(feature = "native")]
mod native {
    use super::*;
    use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
    use std::path::Path;
    use std::time::Duration;

    /// How long a writer waits for another process holding the database lock
    const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

    /// SQLite-backed store that survives restarts
    pub struct SqliteStore {
        db: Mutex<Connection>,
    }

    impl SqliteStore {
        /// Open or create the store at `path`
        pub fn open(path: &Path) -> Result<Self> {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ShareError::Storage(format!("creating {}: {}", parent.display(), e)))?;
            }
            let db = Connection::open(path)?;
            db.execute_batch("PRAGMA journal_mode=WAL;")?;
            db.busy_timeout(BUSY_TIMEOUT)?;
            let store = Self::init(db)?;
            tracing::info!(path = %path.display(), "Pending-write store opened");
            Ok(store)
        }

        /// Store that lives only as long as this value
        pub fn in_memory() -> Result<Self> {
            Self::init(Connection::open_in_memory()?)
        }

        fn init(db: Connection) -> Result<Self> {
            db.execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
                );",
            )?;
            Ok(Self { db: Mutex::new(db) })
        }

        fn db(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
            self.db
                .lock()
                .map_err(|_| ShareError::Storage("sqlite store lock poisoned".into()))
        }
    }

    impl KeyValueStore for SqliteStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            let db = self.db()?;
            let mut stmt = db.prepare_cached("SELECT value FROM kv WHERE key = ?1")?;
            Ok(stmt.query_row([key], |row| row.get(0)).optional()?)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.db()?.execute(
                "INSERT INTO kv (key, value, updated_at)
                 VALUES (?1, ?2, strftime('%s', 'now'))
                 ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = strftime('%s', 'now')",
                rusqlite::params![key, value],
            )?;
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.db()?.execute("DELETE FROM kv WHERE key = ?1", [key])?;
            Ok(())
        }

        fn update(
            &self,
            key: &str,
            apply: &mut dyn FnMut(Option<String>) -> Result<Option<String>>,
        ) -> Result<()> {
            let mut db = self.db()?;
            // IMMEDIATE takes the write lock up front so the read below cannot go stale
            let tx = db.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let current: Option<String> = tx
                .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
                .optional()?;
            match apply(current)? {
                Some(value) => {
                    tx.execute(
                        "INSERT INTO kv (key, value, updated_at)
                         VALUES (?1, ?2, strftime('%s', 'now'))
                         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = strftime('%s', 'now')",
                        rusqlite::params![key, value],
                    )?;
                }
                None => {
                    tx.execute("DELETE FROM kv WHERE key = ?1", [key])?;
                }
            }
            tx.commit()?;
            Ok(())
        }

        fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
            let db = self.db()?;
            let mut stmt = db.prepare_cached(
                "SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
            )?;
            let keys = stmt
                .query_map([prefix], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(keys)
        }
    }
}
