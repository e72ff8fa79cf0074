//! User-facing commands
//!
//! - `init`: Create the metadata directory and the root commit
//! - `add`: Stage a file for addition
//! - `rm`: Stage a file for removal
//! - `commit`: Snapshot the staged changes
//! - `log`: Show history (`log`, `global-log`, `find`)
//! - `status`: Show branches, staged changes and the working tree state
//! - `checkout`: Restore files or switch branches
//! - `branch`: Create and delete branches
//! - `reset`: Move the current branch to another commit
//! - `merge`: Merge another branch into the current one

pub mod add;
pub mod branch;
pub mod checkout;
pub mod commit;
pub mod init;
pub mod log;
pub mod merge;
pub mod reset;
pub mod rm;
pub mod status;
