//! Read-only rollup of completion percentages per act and per department.
//!
//! A (shot, department) cell counts as completed once its status is
//! `approved`.

use serde::Serialize;
use std::collections::HashMap;

use super::status::Department;
use super::Database;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentCompletion {
    pub department: Department,
    pub total: i64,
    pub completed: i64,
    pub pct: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActStats {
    pub act_id: i64,
    pub code: String,
    pub name: String,
    pub departments: Vec<DepartmentCompletion>,
    /// Fraction of all (shot x department) cells approved, rounded.
    pub overall_pct: i64,
}

fn pct(completed: i64, total: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (completed as f64 / total as f64 * 100.0).round() as i64
    }
}

impl Database {
    /// Completion statistics for every act, in display order. Acts with no
    /// shots report all-zero stats.
    pub fn act_stats(&self) -> Result<Vec<ActStats>> {
        let acts = self.list_acts()?;
        let mut out = Vec::with_capacity(acts.len());

        let mut stmt = self.conn().prepare(
            r#"
            SELECT ds.department,
                   COUNT(*),
                   SUM(CASE WHEN ds.status = 'approved' THEN 1 ELSE 0 END)
            FROM department_statuses ds
            JOIN shots s ON s.id = ds.shot_id
            WHERE s.act_id = ?
            GROUP BY ds.department
            "#,
        )?;

        for act in acts {
            let counts: HashMap<Department, (i64, i64)> = stmt
                .query_map([act.id], |row| {
                    Ok((
                        row.get::<_, Department>(0)?,
                        (row.get::<_, i64>(1)?, row.get::<_, i64>(2)?),
                    ))
                })?
                .filter_map(|r| r.ok())
                .collect();

            let mut departments = Vec::with_capacity(Department::ALL.len());
            let mut total_cells = 0;
            let mut completed_cells = 0;
            for department in Department::ALL {
                let (total, completed) = counts.get(&department).copied().unwrap_or((0, 0));
                total_cells += total;
                completed_cells += completed;
                departments.push(DepartmentCompletion {
                    department,
                    total,
                    completed,
                    pct: pct(completed, total),
                });
            }

            out.push(ActStats {
                act_id: act.id,
                code: act.code,
                name: act.name,
                departments,
                overall_pct: pct(completed_cells, total_cells),
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewShot, ShotStatus};

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_act_without_shots_reports_zeros() {
        let db = test_db();
        db.create_act("act01", "Act One", None).unwrap();

        let stats = db.act_stats().unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].overall_pct, 0);
        for dept in &stats[0].departments {
            assert_eq!((dept.total, dept.completed, dept.pct), (0, 0, 0));
        }
    }

    #[test]
    fn test_overall_pct_rounds_cell_fraction() {
        let db = test_db();
        let act = db.create_act("act01", "Act One", None).unwrap();
        let first = db.create_shot(&NewShot::new(act.id, "shot01")).unwrap();
        db.create_shot(&NewShot::new(act.id, "shot02")).unwrap();
        db.create_shot(&NewShot::new(act.id, "shot03")).unwrap();

        // Approve all 7 departments of one shot: 7 of 21 cells.
        for department in Department::ALL {
            db.update_status(first.id, department, ShotStatus::Approved, "lead", None)
                .unwrap();
        }

        let stats = db.act_stats().unwrap();
        assert_eq!(stats[0].overall_pct, 33); // round(7/21 * 100)
        for dept in &stats[0].departments {
            assert_eq!(dept.total, 3);
            assert_eq!(dept.completed, 1);
            assert_eq!(dept.pct, 33);
        }
    }

    #[test]
    fn test_single_department_approval_end_to_end() {
        let db = test_db();
        let act = db.create_act("act01", "Act One", None).unwrap();
        let shot = db.create_shot(&NewShot::new(act.id, "shot01")).unwrap();
        db.update_status(shot.id, Department::Comp, ShotStatus::Approved, "alice", None)
            .unwrap();

        let stats = db.act_stats().unwrap();
        let comp = stats[0]
            .departments
            .iter()
            .find(|d| d.department == Department::Comp)
            .unwrap();
        assert_eq!((comp.total, comp.completed, comp.pct), (1, 1, 100));
        assert_eq!(stats[0].overall_pct, 14); // round(1/7 * 100)
    }

    #[test]
    fn test_non_approved_states_do_not_count() {
        let db = test_db();
        let act = db.create_act("act01", "Act One", None).unwrap();
        let shot = db.create_shot(&NewShot::new(act.id, "shot01")).unwrap();
        db.update_status(shot.id, Department::Comp, ShotStatus::Review, "alice", None)
            .unwrap();
        db.update_status(shot.id, Department::Spline, ShotStatus::Omit, "alice", None)
            .unwrap();

        let stats = db.act_stats().unwrap();
        assert_eq!(stats[0].overall_pct, 0);
    }
}
