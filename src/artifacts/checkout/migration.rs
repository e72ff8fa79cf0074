//! Snapshot migration
//!
//! A migration turns the working copy of one snapshot into another:
//!
//! 1. Files tracked by the source and absent from the target are deleted
//! 2. Files tracked by both are overwritten with the target's version
//! 3. Files only in the target are created
//!
//! Files the source snapshot does not track are never deleted. A write that
//! would clobber untracked content is refused before anything is touched:
//! an untracked file at the same path, untracked files below a directory
//! the new file replaces, or an untracked file where a parent directory
//! has to go.

use crate::areas::database::Database;
use crate::areas::workspace::Workspace;
use crate::artifacts::objects::commit::BlobMapping;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::BitletError;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};

/// Type of file system action required by a migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionType {
    /// Create new file
    Add,
    /// Delete file
    Delete,
    /// Overwrite tracked file
    Modify,
}

/// Planned actions grouped by type; deletions carry no blob
pub type ActionsSet = BTreeMap<ActionType, Vec<(String, Option<ObjectId>)>>;

pub struct Migration<'r> {
    database: &'r Database,
    /// Names tracked by the source snapshot
    tracked: BTreeSet<String>,
    actions: ActionsSet,
}

impl<'r> Migration<'r> {
    /// Plan the move from the `from` snapshot to the `to` snapshot
    pub fn between(database: &'r Database, from: &BlobMapping, to: &BlobMapping) -> Self {
        let mut actions = ActionsSet::from([
            (ActionType::Add, Vec::new()),
            (ActionType::Delete, Vec::new()),
            (ActionType::Modify, Vec::new()),
        ]);

        for name in from.keys().filter(|name| !to.contains_key(*name)) {
            if let Some(deletions) = actions.get_mut(&ActionType::Delete) {
                deletions.push((name.clone(), None));
            }
        }
        for (name, oid) in to {
            let action = if from.contains_key(name) {
                ActionType::Modify
            } else {
                ActionType::Add
            };
            if let Some(planned) = actions.get_mut(&action) {
                planned.push((name.clone(), Some(oid.clone())));
            }
        }

        Migration {
            database,
            tracked: from.keys().cloned().collect(),
            actions,
        }
    }

    pub fn actions(&self) -> &ActionsSet {
        &self.actions
    }

    /// Names the migration would write over untracked content
    pub fn untracked_in_the_way(&self, workspace: &Workspace) -> anyhow::Result<Vec<String>> {
        let untracked = workspace
            .list_files()?
            .into_iter()
            .filter(|name| !self.tracked.contains(name))
            .collect::<BTreeSet<_>>();

        Ok([ActionType::Add, ActionType::Modify]
            .iter()
            .filter_map(|action| self.actions.get(action))
            .flatten()
            .filter(|(name, _)| clobbers_untracked(name, &untracked))
            .map(|(name, _)| name.clone())
            .collect())
    }

    /// Fail with `UntrackedFileConflict` if applying would clobber an untracked file
    pub fn check_untracked(&self, workspace: &Workspace) -> anyhow::Result<()> {
        let in_the_way = self.untracked_in_the_way(workspace)?;
        if in_the_way.is_empty() {
            return Ok(());
        }

        tracing::debug!(files = ?in_the_way, "untracked files block the migration");
        Err(BitletError::UntrackedFileConflict.into())
    }

    pub fn load_blob_data(&self, oid: &ObjectId) -> anyhow::Result<Bytes> {
        Ok(self.database.load_blob(oid)?.into_content())
    }
}

/// Whether writing the file `name` destroys any of the `untracked` files
pub fn clobbers_untracked(name: &str, untracked: &BTreeSet<String>) -> bool {
    if untracked.contains(name) {
        return true;
    }

    let nested_prefix = format!("{name}/");
    let replaces_directory = untracked
        .range(nested_prefix.clone()..)
        .next()
        .is_some_and(|file| file.starts_with(&nested_prefix));
    let replaces_parent_file = name
        .match_indices('/')
        .any(|(end, _)| untracked.contains(&name[..end]));

    replaces_directory || replaces_parent_file
}
