//! Slot storage backed by the local `SQLite` database.

use rusqlite::{params, OptionalExtension};

use super::SlotStore;
use crate::db::Database;
use crate::util::unix_millis_now;
use crate::Result;

/// `SlotStore` over the `slots` table.
pub struct SqliteSlotStore {
    db: Database,
}

impl SqliteSlotStore {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

impl SlotStore for SqliteSlotStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .connection()
            .query_row("SELECT value FROM slots WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.db.connection().execute(
            "INSERT INTO slots (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, unix_millis_now()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db
            .connection()
            .execute("DELETE FROM slots WHERE key = ?", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_missing_slot() {
        let store = SqliteSlotStore::new(Database::open_in_memory().unwrap());
        assert_eq!(store.read("offlineSOSLocations").unwrap(), None);
    }

    #[test]
    fn test_write_overwrites_whole_value() {
        let store = SqliteSlotStore::new(Database::open_in_memory().unwrap());
        store.write("slot", "[1]").unwrap();
        store.write("slot", "[1,2]").unwrap();

        assert_eq!(store.read("slot").unwrap().as_deref(), Some("[1,2]"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = SqliteSlotStore::new(Database::open_in_memory().unwrap());
        store.write("slot", "x").unwrap();
        store.remove("slot").unwrap();
        store.remove("slot").unwrap();

        assert_eq!(store.read("slot").unwrap(), None);
    }

    #[test]
    fn test_value_survives_reopen() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("haven.db");
        {
            let store = SqliteSlotStore::new(Database::open(&db_path).unwrap());
            store.write("slot", "persisted").unwrap();
        }

        let store = SqliteSlotStore::new(Database::open(&db_path).unwrap());
        assert_eq!(store.read("slot").unwrap().as_deref(), Some("persisted"));
    }
}
