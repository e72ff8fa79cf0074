//! Commit history traversal
//!
//! - `rev_list`: first-parent walk from a commit back to the root commit
//!
//! `log` follows only first parents, so a merge commit shows the history of
//! the branch it was made on. `global-log` does not walk at all and lists
//! every stored commit instead.

pub mod rev_list;
