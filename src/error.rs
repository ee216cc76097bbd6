//! Error taxonomy for the tracking core.
//!
//! Validation, conflict, and not-found outcomes are surfaced as distinct
//! variants so callers can map them to specific responses instead of a
//! generic failure.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before any write: malformed act/shot code or an
    /// unknown priority/status/department value.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Duplicate act code, or duplicate (act, shot code) pair.
    #[error("already exists: {0}")]
    Conflict(String),

    /// Operation targets an id that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Reconciliation source directory is missing or unreadable.
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub(crate) fn conflict(msg: impl Into<String>) -> Self {
        Error::Conflict(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }
}
