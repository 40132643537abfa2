//! SQLite-backed learner state storage.
//!
//! Each learner's [`EngagementState`] is one JSON blob in the `learners`
//! table, replaced whole on every save. A small `kv` table holds
//! application state such as the last selected learner.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, decode_state, StateRepository};
use crate::error::{Result, StorageError};
use crate::state::EngagementState;

/// SQLite database holding learner states.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/pawstreak.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("pawstreak.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// In-memory database, mostly for tests.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS learners (
                learner_id TEXT PRIMARY KEY,
                state      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a learner. Returns whether a row was deleted.
    pub fn delete(&self, learner_id: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM learners WHERE learner_id = ?1", params![learner_id])?;
        Ok(n > 0)
    }
}

impl StateRepository for Database {
    fn load(&self, learner_id: &str) -> Result<Option<EngagementState>> {
        let json = self
            .conn
            .query_row(
                "SELECT state FROM learners WHERE learner_id = ?1",
                params![learner_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        json.map(|json| decode_state(learner_id, &json)).transpose()
    }

    fn save(&self, state: &EngagementState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        let updated_at = state.updated_at.unwrap_or_else(Utc::now);
        self.conn.execute(
            "INSERT INTO learners (learner_id, state, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(learner_id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
            params![state.learner_id, json, updated_at.to_rfc3339()],
        )?;
        tracing::debug!(learner = %state.learner_id, bytes = json.len(), "learner state saved");
        Ok(())
    }

    fn learners(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT learner_id FROM learners ORDER BY learner_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}
