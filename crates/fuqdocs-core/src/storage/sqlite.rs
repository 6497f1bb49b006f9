//! SQLite-backed medium
//!
//! One database file is one origin. Each `SqliteMedium` is a handle with its
//! own random origin id; it writes every mutation to `kv` and `changes` in a
//! single transaction, and reads back other handles' rows from `changes`
//! when polled.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::schema::{init_schema, needs_init};
use super::{Medium, StorageEvent};
use crate::error::{MediumError, MediumResult};

/// How long a write waits for another process holding the database lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Persistent medium stored in a SQLite file
pub struct SqliteMedium {
    conn: Connection,
    origin: String,
    /// Highest change `seq` already delivered or skipped
    cursor: Cell<i64>,
    path: Option<PathBuf>,
}

impl SqliteMedium {
    /// Open (or create) the medium at `path`
    ///
    /// Change log rows older than the newest `retention` entries are pruned.
    /// Changes made before this call are never reported by `poll_changes`.
    pub fn open(path: &Path, retention: u64) -> MediumResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| MediumError::from_io(e, parent))?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let medium = Self::with_connection(conn, Some(path.to_path_buf()))?;
        medium.prune(retention)?;
        Ok(medium)
    }

    /// Open a private, non-persistent medium (for testing)
    pub fn open_in_memory() -> MediumResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> MediumResult<Self> {
        if needs_init(&conn) {
            init_schema(&conn)?;
        }

        let head: i64 = conn.query_row("SELECT COALESCE(MAX(seq), 0) FROM changes", [], |row| {
            row.get(0)
        })?;

        Ok(Self {
            conn,
            origin: Uuid::new_v4().to_string(),
            cursor: Cell::new(head),
            path,
        })
    }

    /// The database file, if this medium is persistent
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// This handle's origin id
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Number of rows in the change log
    pub fn change_count(&self) -> MediumResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM changes", [], |row| row.get(0))?)
    }

    fn prune(&self, retention: u64) -> MediumResult<()> {
        let retention = i64::try_from(retention).unwrap_or(i64::MAX);
        let pruned = self.conn.execute(
            "DELETE FROM changes WHERE seq <= (SELECT MAX(seq) FROM changes) - ?1",
            [retention],
        )?;
        if pruned > 0 {
            tracing::debug!("Pruned {} change log entries", pruned);
        }
        Ok(())
    }

    fn write(&self, key: &str, new_value: Option<&str>) -> MediumResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        let old_value: Option<String> = tx
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        if old_value.as_deref() == new_value {
            return Ok(());
        }

        match new_value {
            Some(value) => {
                tx.execute(
                    "INSERT INTO kv (key, value) VALUES (?1, ?2) \
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![key, value],
                )?;
            }
            None => {
                tx.execute("DELETE FROM kv WHERE key = ?1", [key])?;
            }
        }

        tx.execute(
            "INSERT INTO changes (origin, key, old_value, new_value) VALUES (?1, ?2, ?3, ?4)",
            params![self.origin, key, old_value, new_value],
        )?;

        tx.commit()?;
        Ok(())
    }
}

impl Medium for SqliteMedium {
    fn get(&self, key: &str) -> MediumResult<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?)
    }

    fn set(&self, key: &str, value: &str) -> MediumResult<()> {
        self.write(key, Some(value))
    }

    fn remove(&self, key: &str) -> MediumResult<()> {
        self.write(key, None)
    }

    fn keys(&self) -> MediumResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    fn poll_changes(&self) -> MediumResult<Vec<StorageEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, origin, key, old_value, new_value FROM changes \
             WHERE seq > ?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map([self.cursor.get()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                StorageEvent {
                    key: row.get(2)?,
                    old_value: row.get(3)?,
                    new_value: row.get(4)?,
                },
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (seq, origin, event) = row?;
            self.cursor.set(seq);
            if origin != self.origin {
                events.push(event);
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_set_remove() {
        let medium = SqliteMedium::open_in_memory().unwrap();
        assert_eq!(medium.get("k").unwrap(), None);

        medium.set("k", "v1").unwrap();
        medium.set("k", "v2").unwrap();
        assert_eq!(medium.get("k").unwrap(), Some("v2".to_string()));

        medium.remove("k").unwrap();
        assert_eq!(medium.get("k").unwrap(), None);
        assert!(medium.keys().unwrap().is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("storage.sqlite3");

        {
            let medium = SqliteMedium::open(&path, 100).unwrap();
            medium.set("fuqdocs.theme", "light").unwrap();
        }

        let medium = SqliteMedium::open(&path, 100).unwrap();
        assert_eq!(
            medium.get("fuqdocs.theme").unwrap(),
            Some("light".to_string())
        );
        assert_eq!(medium.path(), Some(path.as_path()));
    }

    #[test]
    fn test_changes_visible_to_other_handles() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.sqlite3");

        let a = SqliteMedium::open(&path, 100).unwrap();
        let b = SqliteMedium::open(&path, 100).unwrap();
        assert_ne!(a.origin(), b.origin());

        a.set("k", "v").unwrap();
        b.set("other", "x").unwrap();
        a.remove("k").unwrap();

        let seen_by_b = b.poll_changes().unwrap();
        assert_eq!(seen_by_b.len(), 2);
        assert_eq!(seen_by_b[0].key, "k");
        assert_eq!(seen_by_b[0].new_value.as_deref(), Some("v"));
        assert!(seen_by_b[1].is_removal());
        assert_eq!(seen_by_b[1].old_value.as_deref(), Some("v"));

        let seen_by_a = a.poll_changes().unwrap();
        assert_eq!(seen_by_a.len(), 1);
        assert_eq!(seen_by_a[0].key, "other");

        assert!(b.poll_changes().unwrap().is_empty());
    }

    #[test]
    fn test_history_before_open_is_not_replayed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.sqlite3");

        let a = SqliteMedium::open(&path, 100).unwrap();
        a.set("k", "before").unwrap();

        let b = SqliteMedium::open(&path, 100).unwrap();
        assert!(b.poll_changes().unwrap().is_empty());
    }

    #[test]
    fn test_unchanged_write_is_not_logged() {
        let medium = SqliteMedium::open_in_memory().unwrap();
        medium.set("k", "v").unwrap();
        medium.set("k", "v").unwrap();
        medium.remove("absent").unwrap();
        assert_eq!(medium.change_count().unwrap(), 1);
    }

    #[test]
    fn test_prune_keeps_recent_changes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.sqlite3");

        {
            let medium = SqliteMedium::open(&path, 1000).unwrap();
            for i in 0..10 {
                medium.set("k", &i.to_string()).unwrap();
            }
            assert_eq!(medium.change_count().unwrap(), 10);
        }

        let medium = SqliteMedium::open(&path, 3).unwrap();
        assert_eq!(medium.change_count().unwrap(), 3);
    }
}
