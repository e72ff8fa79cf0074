//! Three-way merge resolution
//!
//! Every filename present in the split point, the head commit or the other
//! commit is classified by membership and, when present in all three, by
//! version equality:
//!
//! | Condition                                             | Outcome       |
//! |-------------------------------------------------------|---------------|
//! | all three, split == other != head                     | `Keep`        |
//! | all three, split == head != other                     | `Checkout`    |
//! | all three, split != other == head                     | no-op         |
//! | all three, split, head and other all different        | `Conflict`    |
//! | only in other                                         | `Create`      |
//! | split and head, not other, file in working directory  | `Delete`      |
//! | split and other, not head, file in working directory  | `Delete`      |
//! | only in head, file in working directory               | `RestoreHead` |
//! | anything else                                         | no-op         |
//!
//! Classification is pure: it only produces a [`MergePlan`]. Applying the
//! plan to the working directory and the staging index is up to the caller.

use crate::artifacts::objects::commit::BlobMapping;
use crate::artifacts::objects::object_id::ObjectId;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};

pub const CONFLICT_HEAD_MARKER: &str = "<<<<<<< HEAD\n";
pub const CONFLICT_SEPARATOR: &str = "=======\n";
pub const CONFLICT_END_MARKER: &str = ">>>>>>>\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Head's version stays as it is
    Keep,
    /// Overwrite the working copy with the other version
    Checkout(ObjectId),
    /// Create the file from the other version
    Create(ObjectId),
    /// Delete the working copy
    Delete,
    /// Rewrite the working copy with head's version
    RestoreHead(ObjectId),
    /// Both sides changed the file differently
    Conflict { head: ObjectId, other: ObjectId },
}

impl MergeOutcome {
    /// Whether applying the outcome writes a file into the working copy
    pub fn writes_workspace(&self) -> bool {
        !matches!(self, MergeOutcome::Keep | MergeOutcome::Delete)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    outcomes: BTreeMap<String, MergeOutcome>,
}

impl MergePlan {
    /// Classify every file of the three snapshots
    ///
    /// `workspace_files` lists the files currently in the working directory.
    pub fn classify(
        split: &BlobMapping,
        head: &BlobMapping,
        other: &BlobMapping,
        workspace_files: &BTreeSet<String>,
    ) -> Self {
        let names = split
            .keys()
            .chain(head.keys())
            .chain(other.keys())
            .collect::<BTreeSet<_>>();

        let outcomes = names
            .into_iter()
            .filter_map(|name| {
                let in_workspace = workspace_files.contains(name);
                Self::classify_file(split.get(name), head.get(name), other.get(name), in_workspace)
                    .map(|outcome| (name.clone(), outcome))
            })
            .collect();

        MergePlan { outcomes }
    }

    fn classify_file(
        split: Option<&ObjectId>,
        head: Option<&ObjectId>,
        other: Option<&ObjectId>,
        in_workspace: bool,
    ) -> Option<MergeOutcome> {
        match (split, head, other) {
            (Some(split), Some(head), Some(other)) => {
                if split == other && split != head {
                    Some(MergeOutcome::Keep)
                } else if split == head && split != other {
                    Some(MergeOutcome::Checkout(other.clone()))
                } else if split != other && other != head && split != head {
                    Some(MergeOutcome::Conflict {
                        head: head.clone(),
                        other: other.clone(),
                    })
                } else {
                    None
                }
            }
            (None, None, Some(other)) => Some(MergeOutcome::Create(other.clone())),
            (Some(_), Some(_), None) if in_workspace => Some(MergeOutcome::Delete),
            (Some(_), None, Some(_)) if in_workspace => Some(MergeOutcome::Delete),
            (None, Some(head), None) if in_workspace => {
                Some(MergeOutcome::RestoreHead(head.clone()))
            }
            _ => None,
        }
    }

    pub fn outcomes(&self) -> &BTreeMap<String, MergeOutcome> {
        &self.outcomes
    }

    pub fn outcome(&self, name: &str) -> Option<&MergeOutcome> {
        self.outcomes.get(name)
    }

    pub fn has_conflicts(&self) -> bool {
        self.outcomes
            .values()
            .any(|outcome| matches!(outcome, MergeOutcome::Conflict { .. }))
    }

    /// Names whose working copy the plan writes, deletions excluded
    pub fn written_files(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.writes_workspace())
            .map(|(name, _)| name.as_str())
    }
}

/// Working copy content for a conflicted file
pub fn conflict_content(head: &[u8], other: &[u8]) -> Bytes {
    let mut content = Vec::with_capacity(
        CONFLICT_HEAD_MARKER.len()
            + head.len()
            + CONFLICT_SEPARATOR.len()
            + other.len()
            + CONFLICT_END_MARKER.len(),
    );
    content.extend_from_slice(CONFLICT_HEAD_MARKER.as_bytes());
    content.extend_from_slice(head);
    content.extend_from_slice(CONFLICT_SEPARATOR.as_bytes());
    content.extend_from_slice(other);
    content.extend_from_slice(CONFLICT_END_MARKER.as_bytes());

    Bytes::from(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn oid(version: &str) -> ObjectId {
        ObjectId::digest(version.as_bytes())
    }

    fn mapping(version: Option<&str>) -> BlobMapping {
        version
            .map(|version| BlobMapping::from([("f".to_string(), oid(version))]))
            .unwrap_or_default()
    }

    fn classify(
        split: Option<&str>,
        head: Option<&str>,
        other: Option<&str>,
        in_workspace: bool,
    ) -> Option<MergeOutcome> {
        let workspace_files = if in_workspace {
            BTreeSet::from(["f".to_string()])
        } else {
            BTreeSet::new()
        };

        MergePlan::classify(
            &mapping(split),
            &mapping(head),
            &mapping(other),
            &workspace_files,
        )
        .outcome("f")
        .cloned()
    }

    #[rstest]
    #[case::modified_in_head_only(Some("s"), Some("h"), Some("s"), true, Some(MergeOutcome::Keep))]
    #[case::modified_in_other_only(Some("s"), Some("s"), Some("o"), true, Some(MergeOutcome::Checkout(oid("o"))))]
    #[case::modified_identically(Some("s"), Some("x"), Some("x"), true, None)]
    #[case::unchanged(Some("s"), Some("s"), Some("s"), true, None)]
    #[case::true_conflict(Some("s"), Some("h"), Some("o"), true, Some(MergeOutcome::Conflict { head: oid("h"), other: oid("o") }))]
    #[case::added_in_other(None, None, Some("o"), false, Some(MergeOutcome::Create(oid("o"))))]
    #[case::removed_in_other(Some("s"), Some("h"), None, true, Some(MergeOutcome::Delete))]
    #[case::removed_in_other_already_gone(Some("s"), Some("h"), None, false, None)]
    #[case::removed_in_head(Some("s"), None, Some("o"), true, Some(MergeOutcome::Delete))]
    #[case::added_in_head(None, Some("h"), None, true, Some(MergeOutcome::RestoreHead(oid("h"))))]
    #[case::added_in_head_missing_from_workspace(None, Some("h"), None, false, None)]
    #[case::added_on_both_sides(None, Some("h"), Some("o"), true, None)]
    #[case::removed_on_both_sides(Some("s"), None, None, true, None)]
    fn files_are_classified_by_the_three_way_table(
        #[case] split: Option<&str>,
        #[case] head: Option<&str>,
        #[case] other: Option<&str>,
        #[case] in_workspace: bool,
        #[case] expected: Option<MergeOutcome>,
    ) {
        assert_eq!(classify(split, head, other, in_workspace), expected);
    }

    #[test]
    fn plan_reports_conflicts_and_written_files() {
        let split = BlobMapping::from([
            ("kept".to_string(), oid("s")),
            ("fought".to_string(), oid("s")),
            ("gone".to_string(), oid("s")),
        ]);
        let head = BlobMapping::from([
            ("kept".to_string(), oid("h")),
            ("fought".to_string(), oid("h")),
        ]);
        let other = BlobMapping::from([
            ("kept".to_string(), oid("s")),
            ("fought".to_string(), oid("o")),
            ("new".to_string(), oid("n")),
            ("gone".to_string(), oid("s")),
        ]);
        let workspace = BTreeSet::from(["gone".to_string()]);

        let plan = MergePlan::classify(&split, &head, &other, &workspace);

        assert!(plan.has_conflicts());
        assert_eq!(plan.outcome("gone"), Some(&MergeOutcome::Delete));
        assert_eq!(plan.written_files().collect::<Vec<_>>(), vec!["fought", "new"]);
    }

    #[test]
    fn conflict_markers_wrap_both_versions() {
        let content = conflict_content(b"head line\n", b"other line\n");

        assert_eq!(
            content.as_ref(),
            b"<<<<<<< HEAD\nhead line\n=======\nother line\n>>>>>>>\n"
        );
    }
}
