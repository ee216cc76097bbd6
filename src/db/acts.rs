//! Acts: ordered top-level groupings of shots.

use rusqlite::params;

use super::Database;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Act {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub sort_order: i64,
}

/// Partial update for an act; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ActUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub sort_order: Option<i64>,
}

/// Act codes are exactly `act` followed by two digits, e.g. `act01`.
pub fn is_valid_act_code(code: &str) -> bool {
    match code.strip_prefix("act") {
        Some(rest) => rest.len() == 2 && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

fn row_to_act(row: &rusqlite::Row<'_>) -> rusqlite::Result<Act> {
    Ok(Act {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        sort_order: row.get(3)?,
    })
}

impl Database {
    pub fn create_act(&self, code: &str, name: &str, sort_order: Option<i64>) -> Result<Act> {
        if !is_valid_act_code(code) {
            return Err(Error::validation(format!(
                "invalid act code '{code}', expected actNN"
            )));
        }
        if self.find_act_by_code(code)?.is_some() {
            return Err(Error::conflict(format!("act '{code}'")));
        }

        // Default placement is append-to-end.
        let sort_order = match sort_order {
            Some(value) => value,
            None => self.conn().query_row(
                "SELECT COALESCE(MAX(sort_order), 0) + 1 FROM acts",
                [],
                |row| row.get(0),
            )?,
        };

        self.conn().execute(
            "INSERT INTO acts (code, name, sort_order) VALUES (?, ?, ?)",
            params![code, name, sort_order],
        )?;
        let id = self.conn().last_insert_rowid();
        tracing::info!(code, name, "created act");

        Ok(Act {
            id,
            code: code.to_string(),
            name: name.to_string(),
            sort_order,
        })
    }

    pub fn get_act(&self, id: i64) -> Result<Option<Act>> {
        let result = self.conn().query_row(
            "SELECT id, code, name, sort_order FROM acts WHERE id = ?",
            [id],
            row_to_act,
        );
        match result {
            Ok(act) => Ok(Some(act)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn find_act_by_code(&self, code: &str) -> Result<Option<Act>> {
        let result = self.conn().query_row(
            "SELECT id, code, name, sort_order FROM acts WHERE code = ?",
            [code],
            row_to_act,
        );
        match result {
            Ok(act) => Ok(Some(act)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn update_act(&self, id: i64, update: ActUpdate) -> Result<Act> {
        let current = self
            .get_act(id)?
            .ok_or_else(|| Error::not_found(format!("act {id}")))?;

        if let Some(ref code) = update.code {
            if !is_valid_act_code(code) {
                return Err(Error::validation(format!(
                    "invalid act code '{code}', expected actNN"
                )));
            }
            if *code != current.code && self.find_act_by_code(code)?.is_some() {
                return Err(Error::conflict(format!("act '{code}'")));
            }
        }

        let code = update.code.unwrap_or(current.code);
        let name = update.name.unwrap_or(current.name);
        let sort_order = update.sort_order.unwrap_or(current.sort_order);

        self.conn().execute(
            "UPDATE acts SET code = ?, name = ?, sort_order = ? WHERE id = ?",
            params![code, name, sort_order, id],
        )?;

        Ok(Act {
            id,
            code,
            name,
            sort_order,
        })
    }

    /// Delete an act and everything under it: shots, their department
    /// statuses, and their log entries. Returns the number of shots that
    /// were cascade-deleted, computed before the delete so callers can
    /// report it.
    pub fn delete_act(&self, id: i64) -> Result<usize> {
        if self.get_act(id)?.is_none() {
            return Err(Error::not_found(format!("act {id}")));
        }

        let tx = self.conn().unchecked_transaction()?;
        let shot_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM shots WHERE act_id = ?",
            [id],
            |row| row.get(0),
        )?;
        tx.execute(
            "DELETE FROM status_log WHERE shot_id IN (SELECT id FROM shots WHERE act_id = ?)",
            [id],
        )?;
        tx.execute(
            "DELETE FROM department_statuses WHERE shot_id IN (SELECT id FROM shots WHERE act_id = ?)",
            [id],
        )?;
        tx.execute("DELETE FROM shots WHERE act_id = ?", [id])?;
        tx.execute("DELETE FROM acts WHERE id = ?", [id])?;
        tx.commit()?;

        tracing::info!(act_id = id, shots = shot_count, "deleted act");
        Ok(shot_count as usize)
    }

    pub fn list_acts(&self) -> Result<Vec<Act>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, code, name, sort_order FROM acts ORDER BY sort_order, code",
        )?;
        let acts = stmt
            .query_map([], row_to_act)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(acts)
    }
}
