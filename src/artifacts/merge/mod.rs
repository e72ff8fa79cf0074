//! Merge algorithms
//!
//! - `split_point`: best common ancestor of two commits
//! - `resolution`: three-way classification of every file into a merge outcome

pub mod resolution;
pub mod split_point;
