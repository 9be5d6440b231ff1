//! Snapshot storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A stored snapshot with the time it was written.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
  pub value: T,
  pub saved_at: DateTime<Utc>,
}

/// Trait for snapshot storage backends. A backend is a key-value store from
/// slot name to one serialized value; each save overwrites the slot.
pub trait SnapshotStore: Send + Sync {
  /// Overwrite the slot with a new value.
  fn save<T: Serialize>(&self, slot: &str, value: &T) -> Result<()>;

  /// Load the slot, or None if nothing was ever saved there.
  fn load<T: DeserializeOwned>(&self, slot: &str) -> Result<Option<Snapshot<T>>>;
}

/// Storage implementation that doesn't persist anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopSnapshots;

impl SnapshotStore for NoopSnapshots {
  fn save<T: Serialize>(&self, _slot: &str, _value: &T) -> Result<()> {
    Ok(()) // Discard
  }

  fn load<T: DeserializeOwned>(&self, _slot: &str) -> Result<Option<Snapshot<T>>> {
    Ok(None) // Always miss
  }
}

/// SQLite-based snapshot storage.
pub struct SqliteSnapshots {
  conn: Mutex<Connection>,
}

impl SqliteSnapshots {
  /// Open the snapshot database at the default location.
  pub fn open() -> Result<Self> {
    Self::open_at(&Self::default_path()?)
  }

  /// Open the snapshot database at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  /// Get the default database path.
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("gigboard").join("cache.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(SNAPSHOT_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

/// Schema for the snapshot table.
const SNAPSHOT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS snapshots (
    slot TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    saved_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl SnapshotStore for SqliteSnapshots {
  fn save<T: Serialize>(&self, slot: &str, value: &T) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let data =
      serde_json::to_vec(value).map_err(|e| eyre!("Failed to serialize snapshot: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO snapshots (slot, data, saved_at)
         VALUES (?, ?, datetime('now'))",
        params![slot, data],
      )
      .map_err(|e| eyre!("Failed to store snapshot: {}", e))?;

    Ok(())
  }

  fn load<T: DeserializeOwned>(&self, slot: &str) -> Result<Option<Snapshot<T>>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT data, saved_at FROM snapshots WHERE slot = ?")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let row: Option<(Vec<u8>, String)> = stmt
      .query_row(params![slot], |row| Ok((row.get(0)?, row.get(1)?)))
      .ok();

    match row {
      Some((data, saved_at_str)) => {
        let value: T = serde_json::from_slice(&data)
          .map_err(|e| eyre!("Failed to deserialize snapshot: {}", e))?;
        let saved_at = parse_datetime(&saved_at_str)?;
        Ok(Some(Snapshot { value, saved_at }))
      }
      None => Ok(None),
    }
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_store() -> (tempfile::TempDir, SqliteSnapshots) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteSnapshots::open_at(&dir.path().join("cache.db")).unwrap();
    (dir, store)
  }

  #[test]
  fn test_save_then_load_round_trips() {
    let (_dir, store) = temp_store();
    store.save("numbers", &vec![1u32, 2, 3]).unwrap();

    let snapshot = store.load::<Vec<u32>>("numbers").unwrap().unwrap();
    assert_eq!(snapshot.value, vec![1, 2, 3]);
  }

  #[test]
  fn test_load_unknown_slot_is_none() {
    let (_dir, store) = temp_store();
    assert!(store.load::<Vec<u32>>("nothing").unwrap().is_none());
  }

  #[test]
  fn test_save_overwrites_previous_value() {
    let (_dir, store) = temp_store();
    store.save("slot", &"first").unwrap();
    store.save("slot", &"second").unwrap();

    let snapshot = store.load::<String>("slot").unwrap().unwrap();
    assert_eq!(snapshot.value, "second");
  }

  #[test]
  fn test_noop_store_always_misses() {
    let store = NoopSnapshots;
    store.save("slot", &42u8).unwrap();
    assert!(store.load::<u8>("slot").unwrap().is_none());
  }
}
