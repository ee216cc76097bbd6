//! Department status ledger: one upsertable row per (shot, department)
//! pair, with an append-only audit trail of actual transitions.

use rusqlite::params;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

use super::{now_timestamp, Database};
use crate::error::{Error, Result};

/// The 7 fixed pipeline stages a shot passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Lookdev,
    Blocking,
    Spline,
    Polish,
    Lighting,
    Rendering,
    Comp,
}

impl Department {
    pub const ALL: [Department; 7] = [
        Department::Lookdev,
        Department::Blocking,
        Department::Spline,
        Department::Polish,
        Department::Lighting,
        Department::Rendering,
        Department::Comp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Lookdev => "lookdev",
            Department::Blocking => "blocking",
            Department::Spline => "spline",
            Department::Polish => "polish",
            Department::Lighting => "lighting",
            Department::Rendering => "rendering",
            Department::Comp => "comp",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "lookdev" => Some(Department::Lookdev),
            "blocking" => Some(Department::Blocking),
            "spline" => Some(Department::Spline),
            "polish" => Some(Department::Polish),
            "lighting" => Some(Department::Lighting),
            "rendering" => Some(Department::Rendering),
            "comp" => Some(Department::Comp),
            _ => None,
        }
    }
}

/// The 5 fixed progress states for a (shot, department) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShotStatus {
    #[default]
    NotStarted,
    InProgress,
    Review,
    Approved,
    Omit,
}

impl ShotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShotStatus::NotStarted => "not-started",
            ShotStatus::InProgress => "in-progress",
            ShotStatus::Review => "review",
            ShotStatus::Approved => "approved",
            ShotStatus::Omit => "omit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "not-started" => Some(ShotStatus::NotStarted),
            "in-progress" => Some(ShotStatus::InProgress),
            "review" => Some(ShotStatus::Review),
            "approved" => Some(ShotStatus::Approved),
            "omit" => Some(ShotStatus::Omit),
            _ => None,
        }
    }
}

impl ToSql for Department {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Department {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Department::from_str(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown department '{s}'").into()))
    }
}

impl ToSql for ShotStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for ShotStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        ShotStatus::from_str(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown status '{s}'").into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentStatus {
    pub id: i64,
    pub shot_id: i64,
    pub department: Department,
    pub status: ShotStatus,
    pub assignee: Option<String>,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLogEntry {
    pub id: i64,
    pub shot_id: i64,
    pub department: Department,
    pub previous_status: ShotStatus,
    pub new_status: ShotStatus,
    pub changed_by: String,
    pub changed_at: String,
}

fn row_to_status(row: &rusqlite::Row<'_>) -> rusqlite::Result<DepartmentStatus> {
    Ok(DepartmentStatus {
        id: row.get(0)?,
        shot_id: row.get(1)?,
        department: row.get(2)?,
        status: row.get(3)?,
        assignee: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl Database {
    /// Set the status of one (shot, department) pair.
    ///
    /// The row is upserted; an omitted `assignee` preserves whatever is
    /// already there rather than blanking it. A log entry is appended only
    /// when the status actually changes, so re-applying the same status is
    /// a silent no-op for the audit trail.
    pub fn update_status(
        &self,
        shot_id: i64,
        department: Department,
        new_status: ShotStatus,
        changed_by: &str,
        assignee: Option<&str>,
    ) -> Result<DepartmentStatus> {
        if self.get_shot(shot_id)?.is_none() {
            return Err(Error::not_found(format!("shot {shot_id}")));
        }

        let tx = self.conn().unchecked_transaction()?;

        let previous: ShotStatus = {
            let result = tx.query_row(
                "SELECT status FROM department_statuses WHERE shot_id = ? AND department = ?",
                params![shot_id, department],
                |row| row.get(0),
            );
            match result {
                Ok(status) => status,
                Err(rusqlite::Error::QueryReturnedNoRows) => ShotStatus::NotStarted,
                Err(e) => return Err(e.into()),
            }
        };

        tx.execute(
            r#"
            INSERT INTO department_statuses (shot_id, department, status, assignee, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (shot_id, department) DO UPDATE SET
                status = excluded.status,
                assignee = COALESCE(excluded.assignee, department_statuses.assignee),
                updated_at = excluded.updated_at
            "#,
            params![shot_id, department, new_status, assignee, now_timestamp()],
        )?;

        if previous != new_status {
            tx.execute(
                r#"
                INSERT INTO status_log (shot_id, department, previous_status, new_status, changed_by, changed_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
                params![shot_id, department, previous, new_status, changed_by, now_timestamp()],
            )?;
            tracing::info!(
                shot_id,
                department = department.as_str(),
                from = previous.as_str(),
                to = new_status.as_str(),
                changed_by,
                "status transition"
            );
        } else {
            tracing::debug!(
                shot_id,
                department = department.as_str(),
                status = new_status.as_str(),
                "status unchanged, no log entry"
            );
        }

        let row = tx.query_row(
            r#"
            SELECT id, shot_id, department, status, assignee, updated_at
            FROM department_statuses
            WHERE shot_id = ? AND department = ?
            "#,
            params![shot_id, department],
            row_to_status,
        )?;
        tx.commit()?;
        Ok(row)
    }

    /// Apply the same status change to several shots, one transaction per
    /// shot. A failure partway through leaves earlier shots updated and
    /// later ones untouched.
    pub fn bulk_update_status(
        &self,
        shot_ids: &[i64],
        department: Department,
        new_status: ShotStatus,
        changed_by: &str,
    ) -> Result<usize> {
        let mut updated = 0;
        for &shot_id in shot_ids {
            self.update_status(shot_id, department, new_status, changed_by, None)?;
            updated += 1;
        }
        Ok(updated)
    }

    /// All department rows for a shot, in pipeline order of creation.
    pub fn shot_statuses(&self, shot_id: i64) -> Result<Vec<DepartmentStatus>> {
        let mut stmt = self.conn().prepare(
            r#"
            SELECT id, shot_id, department, status, assignee, updated_at
            FROM department_statuses
            WHERE shot_id = ?
            ORDER BY id
            "#,
        )?;
        let rows = stmt
            .query_map([shot_id], row_to_status)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// The audit trail for a shot, oldest first.
    pub fn status_log(&self, shot_id: i64) -> Result<Vec<StatusLogEntry>> {
        let mut stmt = self.conn().prepare(
            r#"
            SELECT id, shot_id, department, previous_status, new_status, changed_by, changed_at
            FROM status_log
            WHERE shot_id = ?
            ORDER BY id
            "#,
        )?;
        let rows = stmt
            .query_map([shot_id], |row| {
                Ok(StatusLogEntry {
                    id: row.get(0)?,
                    shot_id: row.get(1)?,
                    department: row.get(2)?,
                    previous_status: row.get(3)?,
                    new_status: row.get(4)?,
                    changed_by: row.get(5)?,
                    changed_at: row.get(6)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewShot;

    fn db_with_shot() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let act = db.create_act("act01", "Act One", None).unwrap();
        let shot = db.create_shot(&NewShot::new(act.id, "shot01")).unwrap();
        (db, shot.id)
    }

    #[test]
    fn test_department_round_trip() {
        for dept in Department::ALL {
            assert_eq!(Department::from_str(dept.as_str()), Some(dept));
        }
        assert_eq!(Department::from_str("layout"), None);
    }

    #[test]
    fn test_transition_writes_one_log_entry() {
        let (db, shot_id) = db_with_shot();
        db.update_status(shot_id, Department::Comp, ShotStatus::InProgress, "alice", None)
            .unwrap();

        let log = db.status_log(shot_id).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].previous_status, ShotStatus::NotStarted);
        assert_eq!(log[0].new_status, ShotStatus::InProgress);
        assert_eq!(log[0].changed_by, "alice");
    }

    #[test]
    fn test_reapplying_same_status_logs_nothing() {
        let (db, shot_id) = db_with_shot();
        db.update_status(shot_id, Department::Comp, ShotStatus::Review, "alice", None)
            .unwrap();
        db.update_status(shot_id, Department::Comp, ShotStatus::Review, "bob", None)
            .unwrap();

        let log = db.status_log(shot_id).unwrap();
        assert_eq!(log.len(), 1, "no-op update must not append to the log");
    }

    #[test]
    fn test_omitted_assignee_is_preserved() {
        let (db, shot_id) = db_with_shot();
        db.update_status(
            shot_id,
            Department::Lighting,
            ShotStatus::InProgress,
            "lead",
            Some("carol"),
        )
        .unwrap();
        let row = db
            .update_status(shot_id, Department::Lighting, ShotStatus::Review, "lead", None)
            .unwrap();
        assert_eq!(row.assignee.as_deref(), Some("carol"));

        let row = db
            .update_status(
                shot_id,
                Department::Lighting,
                ShotStatus::Approved,
                "lead",
                Some("dave"),
            )
            .unwrap();
        assert_eq!(row.assignee.as_deref(), Some("dave"));
    }

    #[test]
    fn test_update_status_missing_shot_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .update_status(99, Department::Comp, ShotStatus::Approved, "alice", None)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_bulk_update_applies_per_shot() {
        let db = Database::open_in_memory().unwrap();
        let act = db.create_act("act01", "Act One", None).unwrap();
        let a = db.create_shot(&NewShot::new(act.id, "shot01")).unwrap();
        let b = db.create_shot(&NewShot::new(act.id, "shot02")).unwrap();

        let updated = db
            .bulk_update_status(&[a.id, b.id], Department::Blocking, ShotStatus::Approved, "lead")
            .unwrap();
        assert_eq!(updated, 2);
        assert_eq!(db.status_log(a.id).unwrap().len(), 1);
        assert_eq!(db.status_log(b.id).unwrap().len(), 1);
    }

    #[test]
    fn test_bulk_update_failure_leaves_earlier_shots_committed() {
        let db = Database::open_in_memory().unwrap();
        let act = db.create_act("act01", "Act One", None).unwrap();
        let a = db.create_shot(&NewShot::new(act.id, "shot01")).unwrap();

        let err = db
            .bulk_update_status(&[a.id, 999], Department::Spline, ShotStatus::Omit, "lead")
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        // The first shot's update was committed before the failure.
        let statuses = db.shot_statuses(a.id).unwrap();
        let spline = statuses
            .iter()
            .find(|s| s.department == Department::Spline)
            .unwrap();
        assert_eq!(spline.status, ShotStatus::Omit);
    }
}
