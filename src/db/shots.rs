//! Shots: units of work within an act.
//!
//! Creating a shot also creates its 7 department status rows in the same
//! transaction, so a shot is never observable without its full status set.

use rusqlite::params;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

use super::status::{Department, ShotStatus};
use super::{now_timestamp, Database};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "critical" => Some(Priority::Critical),
            _ => None,
        }
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Priority::from_str(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown priority '{s}'").into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shot {
    pub id: i64,
    pub act_id: i64,
    pub code: String,
    pub frame_start: i64,
    pub frame_end: i64,
    pub thumbnail: Option<String>,
    pub priority: Priority,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Derived display identifier `{act.code}_{shot.code}`; never stored.
    pub combined_code: String,
}

/// Fields for a new shot. `new()` applies the standard defaults.
#[derive(Debug, Clone)]
pub struct NewShot {
    pub act_id: i64,
    pub code: String,
    pub frame_start: i64,
    pub frame_end: i64,
    pub priority: Priority,
    pub notes: Option<String>,
    pub thumbnail: Option<String>,
}

impl NewShot {
    pub fn new(act_id: i64, code: impl Into<String>) -> Self {
        Self {
            act_id,
            code: code.into(),
            frame_start: 1001,
            frame_end: 1120,
            priority: Priority::Medium,
            notes: None,
            thumbnail: None,
        }
    }
}

/// Partial update for a shot; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ShotUpdate {
    pub code: Option<String>,
    pub act_id: Option<i64>,
    pub frame_start: Option<i64>,
    pub frame_end: Option<i64>,
    pub thumbnail: Option<String>,
    pub priority: Option<Priority>,
    pub notes: Option<String>,
}

/// Filters for listing shots. Department/status are matched against the
/// loaded status rows of each shot, not in SQL, so the whole filter pass
/// is O(shots).
#[derive(Debug, Clone, Default)]
pub struct ShotFilters {
    pub act_id: Option<i64>,
    pub priority: Option<Priority>,
    pub department: Option<Department>,
    pub status: Option<ShotStatus>,
    /// Substring match against `combined_code`.
    pub search: Option<String>,
}

/// Shot codes are exactly `shot` followed by two digits, e.g. `shot01`.
pub fn is_valid_shot_code(code: &str) -> bool {
    match code.strip_prefix("shot") {
        Some(rest) => rest.len() == 2 && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

const SHOT_SELECT: &str = r#"
    SELECT s.id, s.act_id, s.code, s.frame_start, s.frame_end,
           s.thumbnail, s.priority, s.notes, s.created_at, s.updated_at,
           a.code
    FROM shots s
    JOIN acts a ON a.id = s.act_id
"#;

fn row_to_shot(row: &rusqlite::Row<'_>) -> rusqlite::Result<Shot> {
    let code: String = row.get(2)?;
    let act_code: String = row.get(10)?;
    Ok(Shot {
        id: row.get(0)?,
        act_id: row.get(1)?,
        combined_code: format!("{act_code}_{code}"),
        code,
        frame_start: row.get(3)?,
        frame_end: row.get(4)?,
        thumbnail: row.get(5)?,
        priority: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl Database {
    /// Create a shot and, in the same transaction, its 7 department rows,
    /// all `not-started` with no assignee.
    pub fn create_shot(&self, new: &NewShot) -> Result<Shot> {
        if !is_valid_shot_code(&new.code) {
            return Err(Error::validation(format!(
                "invalid shot code '{}', expected shotNN",
                new.code
            )));
        }
        let act = self
            .get_act(new.act_id)?
            .ok_or_else(|| Error::not_found(format!("act {}", new.act_id)))?;
        if self.find_shot_by_code(new.act_id, &new.code)?.is_some() {
            return Err(Error::conflict(format!("shot '{}_{}'", act.code, new.code)));
        }

        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            r#"
            INSERT INTO shots (act_id, code, frame_start, frame_end, thumbnail, priority, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                new.act_id,
                new.code,
                new.frame_start,
                new.frame_end,
                new.thumbnail,
                new.priority,
                new.notes,
            ],
        )?;
        let shot_id = tx.last_insert_rowid();
        for department in Department::ALL {
            tx.execute(
                "INSERT INTO department_statuses (shot_id, department, status) VALUES (?, ?, ?)",
                params![shot_id, department, ShotStatus::NotStarted],
            )?;
        }
        tx.commit()?;
        let combined = format!("{}_{}", act.code, new.code);
        tracing::info!(shot = %combined, "created shot");

        self.get_shot(shot_id)?
            .ok_or_else(|| Error::not_found(format!("shot {shot_id}")))
    }

    pub fn get_shot(&self, id: i64) -> Result<Option<Shot>> {
        let sql = format!("{SHOT_SELECT} WHERE s.id = ?");
        let result = self.conn().query_row(&sql, [id], row_to_shot);
        match result {
            Ok(shot) => Ok(Some(shot)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn find_shot_by_code(&self, act_id: i64, code: &str) -> Result<Option<Shot>> {
        let sql = format!("{SHOT_SELECT} WHERE s.act_id = ? AND s.code = ?");
        let result = self
            .conn()
            .query_row(&sql, params![act_id, code], row_to_shot);
        match result {
            Ok(shot) => Ok(Some(shot)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Partial update. Always bumps `updated_at`, even when only one field
    /// changes.
    pub fn update_shot(&self, id: i64, update: ShotUpdate) -> Result<Shot> {
        let current = self
            .get_shot(id)?
            .ok_or_else(|| Error::not_found(format!("shot {id}")))?;

        if let Some(ref code) = update.code {
            if !is_valid_shot_code(code) {
                return Err(Error::validation(format!(
                    "invalid shot code '{code}', expected shotNN"
                )));
            }
        }

        let act_id = update.act_id.unwrap_or(current.act_id);
        if self.get_act(act_id)?.is_none() {
            return Err(Error::not_found(format!("act {act_id}")));
        }
        let code = update.code.unwrap_or_else(|| current.code.clone());
        if (act_id, code.as_str()) != (current.act_id, current.code.as_str()) {
            if let Some(existing) = self.find_shot_by_code(act_id, &code)? {
                if existing.id != id {
                    return Err(Error::conflict(format!("shot '{}'", existing.combined_code)));
                }
            }
        }

        let frame_start = update.frame_start.unwrap_or(current.frame_start);
        let frame_end = update.frame_end.unwrap_or(current.frame_end);
        let thumbnail = update.thumbnail.or(current.thumbnail);
        let priority = update.priority.unwrap_or(current.priority);
        let notes = update.notes.or(current.notes);

        self.conn().execute(
            r#"
            UPDATE shots
            SET code = ?, act_id = ?, frame_start = ?, frame_end = ?,
                thumbnail = ?, priority = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
            params![
                code,
                act_id,
                frame_start,
                frame_end,
                thumbnail,
                priority,
                notes,
                now_timestamp(),
                id,
            ],
        )?;

        self.get_shot(id)?
            .ok_or_else(|| Error::not_found(format!("shot {id}")))
    }

    /// Delete a shot along with its status rows and log entries.
    pub fn delete_shot(&self, id: i64) -> Result<()> {
        if self.get_shot(id)?.is_none() {
            return Err(Error::not_found(format!("shot {id}")));
        }
        let tx = self.conn().unchecked_transaction()?;
        tx.execute("DELETE FROM status_log WHERE shot_id = ?", [id])?;
        tx.execute("DELETE FROM department_statuses WHERE shot_id = ?", [id])?;
        tx.execute("DELETE FROM shots WHERE id = ?", [id])?;
        tx.commit()?;
        tracing::info!(shot_id = id, "deleted shot");
        Ok(())
    }

    /// List shots, joined against acts for `combined_code`. All filters
    /// are applied after loading; a shot qualifies for the
    /// department/status filter if any of its status rows matches the
    /// requested combination.
    pub fn list_shots(&self, filters: &ShotFilters) -> Result<Vec<Shot>> {
        let sql = format!("{SHOT_SELECT} ORDER BY a.code, s.code");
        let mut stmt = self.conn().prepare(&sql)?;
        let shots: Vec<Shot> = stmt
            .query_map([], row_to_shot)?
            .filter_map(|r| r.ok())
            .collect();

        let mut out = Vec::with_capacity(shots.len());
        for shot in shots {
            if let Some(act_id) = filters.act_id {
                if shot.act_id != act_id {
                    continue;
                }
            }
            if let Some(priority) = filters.priority {
                if shot.priority != priority {
                    continue;
                }
            }
            if let Some(ref search) = filters.search {
                if !shot.combined_code.contains(search.as_str()) {
                    continue;
                }
            }
            if filters.department.is_some() || filters.status.is_some() {
                let statuses = self.shot_statuses(shot.id)?;
                let matched = statuses.iter().any(|row| {
                    filters.department.map_or(true, |d| row.department == d)
                        && filters.status.map_or(true, |s| row.status == s)
                });
                if !matched {
                    continue;
                }
            }
            out.push(shot);
        }
        Ok(out)
    }
}
