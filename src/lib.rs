//! bitlet: a small local version-control system
//!
//! Files are snapshotted into a content-addressed object database, commits
//! form a history graph, and branches are merged with a three-way merge.
//!
//! - `areas`: the on-disk parts of a repository and the [`Repository`](areas::repository::Repository) context
//! - `artifacts`: data structures and algorithms (objects, staging format, merge, ...)
//! - `commands`: one module per command line verb
//! - `errors`: user-facing failures
//! - `telemetry`: opt-in diagnostic logging

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;
pub mod telemetry;
