//! Core repository components
//!
//! - `database`: Object database holding blobs and commits
//! - `graph`: Derived commit graph used for ancestry queries
//! - `index`: Staging area (pending additions and removals)
//! - `lock`: Repository-wide process lock
//! - `refs`: Branch pointers and HEAD
//! - `repository`: Ties the areas together for the commands
//! - `workspace`: Working directory file system operations

pub mod database;
pub mod graph;
pub mod index;
pub mod lock;
pub mod refs;
pub mod repository;
pub mod workspace;
