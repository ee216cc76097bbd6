//! Filesystem reconciliation.
//!
//! Derives acts, shots, and thumbnail references from conventionally named
//! preview images in a directory. The scan is a pure `files -> desired
//! state` function; `apply` then diffs desired state against the store and
//! writes only the delta, which makes re-runs against an unchanged
//! directory no-ops by construction.

pub mod parse;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Serialize;

use crate::config::ReconcileConfig;
use crate::db::{Database, NewShot, ShotUpdate};
use crate::error::{Error, Result};

pub use parse::{act_display_name, parse_thumbnail_filename, ThumbnailFile};

/// Change summary returned by `apply`. Newly created shots count toward
/// `thumbnails_updated` as well, since their thumbnail is set at creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub acts_created: usize,
    pub shots_created: usize,
    pub thumbnails_updated: usize,
}

impl ReconcileSummary {
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Scan the directory and return the winning thumbnail per (act, shot)
/// pair, in (act, shot) order, without touching the store.
pub fn preview(directory: &Path, config: &ReconcileConfig) -> Result<Vec<ThumbnailFile>> {
    Ok(desired_state(directory, config)?.into_values().collect())
}

/// `files -> desired state`: one winning filename per (act, shot) pair.
/// When several files map to the same pair, the lexicographically greatest
/// filename wins; directory listing order never matters.
fn desired_state(
    directory: &Path,
    config: &ReconcileConfig,
) -> Result<BTreeMap<(String, String), ThumbnailFile>> {
    let entries = std::fs::read_dir(directory)
        .map_err(|_| Error::DirectoryNotFound(directory.to_path_buf()))?;

    let mut desired: BTreeMap<(String, String), ThumbnailFile> = BTreeMap::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        let file = match parse_thumbnail_filename(name, &config.image_extensions) {
            Some(file) => file,
            None => continue,
        };
        let key = (file.act_code.clone(), file.shot_code.clone());
        match desired.get(&key) {
            Some(existing) if existing.filename >= file.filename => {}
            _ => {
                desired.insert(key, file);
            }
        }
    }
    Ok(desired)
}

/// Apply the desired state to the store: create missing acts (ascending
/// code order, so parents exist before their shots), create missing shots,
/// and refresh thumbnail references that differ from the winning filename.
pub fn apply(db: &Database, directory: &Path, config: &ReconcileConfig) -> Result<ReconcileSummary> {
    let desired = desired_state(directory, config)?;
    let mut summary = ReconcileSummary::default();

    let act_codes: BTreeSet<&String> = desired.keys().map(|(act_code, _)| act_code).collect();
    for code in act_codes {
        if db.find_act_by_code(code)?.is_none() {
            db.create_act(code, &act_display_name(code), None)?;
            summary.acts_created += 1;
        }
    }

    for ((act_code, shot_code), file) in &desired {
        let act = db
            .find_act_by_code(act_code)?
            .ok_or_else(|| Error::not_found(format!("act '{act_code}'")))?;
        match db.find_shot_by_code(act.id, shot_code)? {
            None => {
                let mut new_shot = NewShot::new(act.id, shot_code.clone());
                new_shot.thumbnail = Some(file.filename.clone());
                db.create_shot(&new_shot)?;
                summary.shots_created += 1;
                summary.thumbnails_updated += 1;
            }
            Some(shot) if shot.thumbnail.as_deref() != Some(file.filename.as_str()) => {
                db.update_shot(
                    shot.id,
                    ShotUpdate {
                        thumbnail: Some(file.filename.clone()),
                        ..Default::default()
                    },
                )?;
                summary.thumbnails_updated += 1;
            }
            Some(_) => {
                tracing::debug!(act = %act_code, shot = %shot_code, "thumbnail unchanged");
            }
        }
    }

    tracing::info!(
        acts = summary.acts_created,
        shots = summary.shots_created,
        thumbnails = summary.thumbnails_updated,
        "reconciliation complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn setup() -> (Database, ReconcileConfig) {
        (Database::open_in_memory().unwrap(), ReconcileConfig::default())
    }

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn test_missing_directory_fails_without_mutation() {
        let (db, config) = setup();
        let err = apply(&db, Path::new("/no/such/directory"), &config).unwrap_err();
        assert!(matches!(err, Error::DirectoryNotFound(_)));
        assert!(db.list_acts().unwrap().is_empty());
    }

    #[test]
    fn test_apply_creates_acts_and_shots() {
        let (db, config) = setup();
        let dir = tempdir().unwrap();
        touch(dir.path(), "act01_shot01_0010.png");
        touch(dir.path(), "act01_shot02_0010.jpg");
        touch(dir.path(), "act03_shot01.jpeg");
        touch(dir.path(), "reference.txt");

        let summary = apply(&db, dir.path(), &config).unwrap();
        assert_eq!(summary.acts_created, 2);
        assert_eq!(summary.shots_created, 3);
        assert_eq!(summary.thumbnails_updated, 3);

        let acts = db.list_acts().unwrap();
        assert_eq!(acts.len(), 2);
        assert_eq!(acts[0].code, "act01");
        assert_eq!(acts[0].name, "Act 1");
        assert_eq!(acts[1].name, "Act 3");

        let shot = db.find_shot_by_code(acts[0].id, "shot01").unwrap().unwrap();
        assert_eq!(shot.thumbnail.as_deref(), Some("act01_shot01_0010.png"));
        // Shots created through reconciliation get the full status set too.
        assert_eq!(db.shot_statuses(shot.id).unwrap().len(), 7);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let (db, config) = setup();
        let dir = tempdir().unwrap();
        touch(dir.path(), "act01_shot01_0010.png");
        touch(dir.path(), "act02_shot01_0010.png");

        let first = apply(&db, dir.path(), &config).unwrap();
        assert!(!first.is_noop());

        let second = apply(&db, dir.path(), &config).unwrap();
        assert!(second.is_noop());
        assert_eq!(second, ReconcileSummary::default());
    }

    #[test]
    fn test_tie_break_takes_lexicographically_greatest() {
        let (db, config) = setup();
        let dir = tempdir().unwrap();
        touch(dir.path(), "act01_shot01_0001.png");
        touch(dir.path(), "act01_shot01_0002.png");

        let summary = apply(&db, dir.path(), &config).unwrap();
        assert_eq!(summary.shots_created, 1);

        let act = db.find_act_by_code("act01").unwrap().unwrap();
        let shot = db.find_shot_by_code(act.id, "shot01").unwrap().unwrap();
        assert_eq!(shot.thumbnail.as_deref(), Some("act01_shot01_0002.png"));
    }

    #[test]
    fn test_existing_shot_thumbnail_refreshed_only_on_change() {
        let (db, config) = setup();
        let dir = tempdir().unwrap();
        touch(dir.path(), "act01_shot01_0001.png");
        apply(&db, dir.path(), &config).unwrap();

        // A newer frame appears; only the thumbnail should change.
        touch(dir.path(), "act01_shot01_0005.png");
        let summary = apply(&db, dir.path(), &config).unwrap();
        assert_eq!(summary.acts_created, 0);
        assert_eq!(summary.shots_created, 0);
        assert_eq!(summary.thumbnails_updated, 1);

        let act = db.find_act_by_code("act01").unwrap().unwrap();
        let shot = db.find_shot_by_code(act.id, "shot01").unwrap().unwrap();
        assert_eq!(shot.thumbnail.as_deref(), Some("act01_shot01_0005.png"));
    }

    #[test]
    fn test_preview_reports_without_writing() {
        let (db, config) = setup();
        let dir = tempdir().unwrap();
        touch(dir.path(), "act01_shot01_0001.png");
        touch(dir.path(), "act01_shot01_0002.png");
        touch(dir.path(), "act02_shot01.jpg");

        let files = preview(dir.path(), &config).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, "act01_shot01_0002.png");
        assert_eq!(files[1].filename, "act02_shot01.jpg");
        assert!(db.list_acts().unwrap().is_empty());
    }

    #[test]
    fn test_existing_acts_are_reused() {
        let (db, config) = setup();
        let act = db.create_act("act01", "Opening", None).unwrap();
        let dir = tempdir().unwrap();
        touch(dir.path(), "act01_shot01_0001.png");

        let summary = apply(&db, dir.path(), &config).unwrap();
        assert_eq!(summary.acts_created, 0);
        assert_eq!(summary.shots_created, 1);

        // The hand-made act keeps its name.
        assert_eq!(db.get_act(act.id).unwrap().unwrap().name, "Opening");
    }
}
