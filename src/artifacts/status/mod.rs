//! Working tree status inspection
//!
//! Compares the working directory with the staging index and the head
//! commit.
//!
//! ## Components
//!
//! - `file_change`: kinds of unstaged change
//! - `status_info`: the five status sections and their rendering

pub mod file_change;
pub mod status_info;
