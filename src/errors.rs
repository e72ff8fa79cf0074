//! User-facing failures
//!
//! [`BitletError`] covers every condition a command reports to the user as a
//! plain message. Anything else (I/O, corrupt objects) travels as a plain
//! `anyhow::Error` and is reported as fatal by the binary.

use crate::artifacts::objects::object_type::ObjectType;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitletError {
    #[error("Not in an initialized bitlet directory.")]
    InitializationMissing,

    #[error("A bitlet version-control system already exists in the current directory.")]
    AlreadyInitialized,

    #[error("File does not exist.")]
    FileNotFound,

    #[error("File does not exist in that commit.")]
    FileNotInCommit,

    #[error("No commit with that id exists.")]
    CommitNotFound,

    /// A stored object the repository points at is missing.
    #[error("{0} object {1} not found")]
    ObjectNotFound(ObjectType, String),

    #[error("A branch with that name does not exist.")]
    BranchNotFound,

    #[error("A branch with that name already exists.")]
    BranchAlreadyExists,

    #[error("Invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("No need to checkout the current branch.")]
    CheckoutCurrentBranch,

    #[error("Cannot remove the current branch.")]
    RemoveCurrentBranch,

    #[error("No reason to remove the file.")]
    NothingToRemove,

    #[error("No changes added to the commit.")]
    EmptyChangeSet,

    #[error("Please enter a commit message.")]
    EmptyCommitMessage,

    #[error("Found no commit with that message.")]
    NoCommitWithMessage,

    #[error("There is an untracked file in the way; delete it, or add and commit it first.")]
    UntrackedFileConflict,

    #[error("You have uncommitted changes.")]
    StagedChangesPending,

    #[error("Cannot merge a branch with itself.")]
    SelfMerge,

    #[error("{0}")]
    AmbiguousOrInvalidArgs(String),
}

impl BitletError {
    pub fn incorrect_operands() -> Self {
        BitletError::AmbiguousOrInvalidArgs("Incorrect operands.".to_string())
    }
}
