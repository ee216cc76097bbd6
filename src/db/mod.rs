//! SQLite-backed persistence for acts, shots, and department statuses.
//!
//! One `Database` handle wraps a single connection, opened once at startup
//! and passed by reference. All operations are synchronous; `initialize`
//! runs on open so tables exist before first use.

mod schema;

pub mod acts;
pub mod shots;
pub mod stats;
pub mod status;

use chrono::Utc;
use rusqlite::Connection;
use std::path::Path;

use crate::error::Result;

pub use acts::{Act, ActUpdate};
pub use shots::{NewShot, Priority, Shot, ShotFilters, ShotUpdate};
pub use stats::{ActStats, DepartmentCompletion};
pub use status::{Department, DepartmentStatus, ShotStatus, StatusLogEntry};

use schema::SCHEMA;

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the store at `path`, creating parent directories and tables as
    /// needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// In-memory store. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.pragma_update(None, "foreign_keys", true)?;
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// ISO-8601 timestamp used for explicit `updated_at`/`changed_at` bumps,
/// matching the `CURRENT_TIMESTAMP` format SQLite writes.
pub(crate) fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
