use crate::areas::index::Index;
use crate::areas::workspace::Workspace;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::commit::BlobMapping;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::status::file_change::WorkspaceChangeType;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

pub type FileSet = BTreeSet<String>;
pub type ChangeSet = BTreeMap<String, WorkspaceChangeType>;

/// The five sections printed by `status`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusInfo {
    pub(crate) current_branch: Option<BranchName>,
    pub(crate) branches: Vec<BranchName>,
    pub(crate) staged_files: FileSet,
    pub(crate) removed_files: FileSet,
    pub(crate) workspace_changeset: ChangeSet,
    pub(crate) untracked_files: FileSet,
}

impl StatusInfo {
    /// Inspect the working directory against the index and the head snapshot
    pub fn inspect(
        current_branch: BranchName,
        branches: Vec<BranchName>,
        head: &BlobMapping,
        index: &Index,
        workspace: &Workspace,
    ) -> anyhow::Result<Self> {
        let workspace_files = workspace
            .list_files()?
            .into_iter()
            .map(|name| {
                let oid = workspace.parse_blob(&name)?.object_id()?;
                Ok((name, oid))
            })
            .collect::<anyhow::Result<BTreeMap<_, _>>>()?;

        let mut status = Self::compare(head, index.additions(), index.removals(), &workspace_files);
        status.current_branch = Some(current_branch);
        status.branches = branches;

        Ok(status)
    }

    /// Pure comparison of the three areas; `workspace_files` maps names to content ids
    pub fn compare(
        head: &BlobMapping,
        additions: &BTreeMap<String, ObjectId>,
        removals: &BTreeMap<String, ObjectId>,
        workspace_files: &BTreeMap<String, ObjectId>,
    ) -> Self {
        let mut workspace_changeset = ChangeSet::new();

        for (name, staged_oid) in additions {
            match workspace_files.get(name) {
                None => {
                    workspace_changeset.insert(name.clone(), WorkspaceChangeType::Deleted);
                }
                Some(oid) if oid != staged_oid => {
                    workspace_changeset.insert(name.clone(), WorkspaceChangeType::Modified);
                }
                Some(_) => {}
            }
        }

        for (name, tracked_oid) in head {
            if additions.contains_key(name) || removals.contains_key(name) {
                continue;
            }
            match workspace_files.get(name) {
                None => {
                    workspace_changeset.insert(name.clone(), WorkspaceChangeType::Deleted);
                }
                Some(oid) if oid != tracked_oid => {
                    workspace_changeset.insert(name.clone(), WorkspaceChangeType::Modified);
                }
                Some(_) => {}
            }
        }

        let untracked_files = workspace_files
            .keys()
            .filter(|name| {
                let tracked = head.contains_key(*name) && !removals.contains_key(*name);
                !additions.contains_key(*name) && !tracked
            })
            .cloned()
            .collect();

        StatusInfo {
            current_branch: None,
            branches: vec![],
            staged_files: additions.keys().cloned().collect(),
            removed_files: removals.keys().cloned().collect(),
            workspace_changeset,
            untracked_files,
        }
    }

    pub fn staged_files(&self) -> &FileSet {
        &self.staged_files
    }

    pub fn removed_files(&self) -> &FileSet {
        &self.removed_files
    }

    pub fn workspace_changeset(&self) -> &ChangeSet {
        &self.workspace_changeset
    }

    pub fn untracked_files(&self) -> &FileSet {
        &self.untracked_files
    }

    pub fn render(&self) -> String {
        let mut output = String::new();

        let branches = self.branches.iter().map(|branch| {
            if Some(branch) == self.current_branch.as_ref() {
                format!("*{branch}")
            } else {
                branch.to_string()
            }
        });
        Self::render_section(&mut output, "Branches", branches);
        Self::render_section(&mut output, "Staged Files", self.staged_files.iter().cloned());
        Self::render_section(&mut output, "Removed Files", self.removed_files.iter().cloned());
        Self::render_section(
            &mut output,
            "Modifications Not Staged For Commit",
            self.workspace_changeset
                .iter()
                .map(|(name, change)| format!("{name} ({change})")),
        );
        Self::render_section(
            &mut output,
            "Untracked Files",
            self.untracked_files.iter().cloned(),
        );

        output
    }

    fn render_section(output: &mut String, title: &str, lines: impl Iterator<Item = String>) {
        let _ = writeln!(output, "=== {title} ===");
        for line in lines {
            let _ = writeln!(output, "{line}");
        }
        let _ = writeln!(output);
    }
}
