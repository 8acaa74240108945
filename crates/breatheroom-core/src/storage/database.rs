//! SQLite-backed key-value store.
//!
//! Plays the role of browser local storage:
//! - `meditationStats`: the persisted [`crate::SessionStats`] JSON
//! - `session_controller`: the serialized controller, so one-shot CLI
//!   commands can continue a session across invocations

use std::path::Path;

use rusqlite::{params, Connection};

use super::data_dir;
use super::local::LocalStore;
use crate::error::{DatabaseError, Result};
use crate::session::SessionController;

/// Key holding the serialized controller between CLI invocations.
pub const CONTROLLER_KEY: &str = "session_controller";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/breatheroom/breatheroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("breatheroom.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Load the persisted controller, or `None` if absent or unreadable.
    pub fn load_controller(&self) -> Option<SessionController> {
        let json = match self.kv_get(CONTROLLER_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "could not read session controller");
                return None;
            }
        };
        match serde_json::from_str(&json) {
            Ok(controller) => Some(controller),
            Err(e) => {
                tracing::warn!(error = %e, "discarding malformed session controller");
                None
            }
        }
    }

    pub fn save_controller(&self, controller: &SessionController) -> Result<()> {
        let json = serde_json::to_string(controller)?;
        self.kv_set(CONTROLLER_KEY, &json)?;
        Ok(())
    }
}

impl LocalStore for Database {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.kv_get(key)?)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        Ok(self.kv_set(key, value)?)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        Ok(self.kv_delete(key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionSettings, SessionStatus};

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("test", "again").unwrap();
        assert_eq!(db.get_item("test").unwrap().as_deref(), Some("again"));
        db.remove_item("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn controller_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert!(db.load_controller().is_none());

        let mut controller = SessionController::new(SessionSettings::default());
        controller.start().unwrap();
        db.save_controller(&controller).unwrap();

        let loaded = db.load_controller().unwrap();
        assert_eq!(loaded.status(), SessionStatus::Running);
        assert_eq!(loaded.session_id(), controller.session_id());
    }

    #[test]
    fn malformed_controller_is_ignored() {
        let db = Database::open_memory().unwrap();
        db.kv_set(CONTROLLER_KEY, "[]").unwrap();
        assert!(db.load_controller().is_none());
    }

    #[test]
    fn file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("breatheroom.db");
        Database::open_at(&path).unwrap().kv_set("k", "v").unwrap();
        let reopened = Database::open_at(&path).unwrap();
        assert_eq!(reopened.kv_get("k").unwrap().as_deref(), Some("v"));
    }
}
