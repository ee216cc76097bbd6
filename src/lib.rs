//! Production shot tracking and filesystem reconciliation.
//!
//! Tracks per-shot, per-department status for an animation pipeline in a
//! SQLite store, keeps an append-only log of status transitions, rolls up
//! completion statistics per act, and reconciles the store against a
//! directory of conventionally named preview thumbnails.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod reconcile;
