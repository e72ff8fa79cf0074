//! Version-control data structures and algorithms
//!
//! - `branch`: Branch names and commit-id arguments
//! - `checkout`: Checkout targets and snapshot migrations
//! - `core`: Shared utilities (pager wrapper)
//! - `database`: Object store backends
//! - `index`: On-disk format of the staging index
//! - `log`: Commit history traversal
//! - `merge`: Split point search and three-way resolution
//! - `objects`: Object types (blob, commit)
//! - `status`: Working tree status inspection

pub mod branch;
pub mod checkout;
pub mod core;
pub mod database;
pub mod index;
pub mod log;
pub mod merge;
pub mod objects;
pub mod status;
