//! Checkout operations
//!
//! This module handles moving the working directory from one snapshot to
//! another:
//! - `target`: what a `checkout` invocation asks for
//! - `migration`: the planned file system changes between two snapshots,
//!   shared by `checkout`, `reset` and fast-forward merges
//!
//! Migrations are planned before execution so untracked files in the way
//! are detected before any change is made.

pub mod migration;
pub mod target;
