use super::{FilterStore, StoredState};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;
use tracing::info;

/// Durable store. The whole document is one JSON row; writes replace it
/// atomically, which matches the single-record shape of the state.
pub struct SqliteStore {
    db_path: String,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(db_path: impl Into<String>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open database at {}", db_path))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(Self {
            db_path,
            conn: Mutex::new(conn),
        })
    }

    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS filter_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                updated_at INTEGER NOT NULL,
                doc TEXT NOT NULL
            )",
            [],
        )?;
        info!("SQLite store initialized at {}", self.db_path);
        Ok(())
    }
}

#[async_trait]
impl FilterStore for SqliteStore {
    async fn load(&self) -> Result<Option<StoredState>> {
        let conn = self.conn.lock().unwrap();
        let doc: Option<String> = conn
            .query_row("SELECT doc FROM filter_state WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()
            .context("failed to read state document")?;

        match doc {
            Some(json) => {
                let state =
                    serde_json::from_str(&json).context("stored state document is corrupt")?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, state: &StoredState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        let now = chrono::Utc::now().timestamp();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO filter_state (id, updated_at, doc) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET updated_at = ?1, doc = ?2",
            params![now, json],
        )
        .context("failed to write state document")?;
        Ok(())
    }
}
