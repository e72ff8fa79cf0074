use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::checkout::migration::clobbers_untracked;
use crate::artifacts::merge::resolution::{MergeOutcome, MergePlan, conflict_content};
use crate::artifacts::merge::split_point::SplitPointFinder;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::BitletError;
use anyhow::Context;
use std::collections::BTreeSet;
use std::io::Write;

pub const ANCESTOR_NOTICE: &str = "Given branch is an ancestor of the current branch.";
pub const FAST_FORWARD_NOTICE: &str = "Current branch fast-forwarded.";
pub const CONFLICT_NOTICE: &str = "Encountered a merge conflict.";

impl Repository {
    pub async fn merge(&mut self, branch: &str) -> anyhow::Result<()> {
        let index = self.index();
        let mut index = index.lock().await;
        index.rehydrate()?;

        if !index.is_empty() {
            return Err(BitletError::StagedChangesPending.into());
        }

        let other_branch =
            BranchName::try_parse(branch.to_string()).map_err(|_| BitletError::BranchNotFound)?;
        let other_oid = self
            .refs()
            .read_branch(&other_branch)?
            .ok_or(BitletError::BranchNotFound)?;
        let current_branch = self.refs().current_branch()?;
        if current_branch == other_branch {
            return Err(BitletError::SelfMerge.into());
        }

        let head_oid = self.refs().read_head()?;
        let split_oid = self.find_split_point(&head_oid, &other_oid)?;
        tracing::debug!(head = %head_oid, other = %other_oid, split = %split_oid, "found split point");

        if split_oid == other_oid {
            writeln!(self.writer(), "{ANCESTOR_NOTICE}")?;
            return Ok(());
        }

        let head = self.database().load_commit(&head_oid)?;
        let other = self.database().load_commit(&other_oid)?;

        if split_oid == head_oid {
            self.checkout_snapshot(&mut index, &head, &other)?;
            self.refs().update_head(&other_oid)?;
            writeln!(self.writer(), "{FAST_FORWARD_NOTICE}")?;
            return Ok(());
        }

        let split = self.database().load_commit(&split_oid)?;
        let workspace_files = self
            .workspace()
            .list_files()?
            .into_iter()
            .collect::<BTreeSet<_>>();
        let plan = MergePlan::classify(split.blobs(), head.blobs(), other.blobs(), &workspace_files);

        let untracked_files = workspace_files
            .iter()
            .filter(|name| !head.tracks(name))
            .cloned()
            .collect::<BTreeSet<_>>();
        if plan
            .written_files()
            .any(|name| clobbers_untracked(name, &untracked_files))
        {
            return Err(BitletError::UntrackedFileConflict.into());
        }

        self.apply_merge_plan(&mut index, &head, &plan)?;
        index.write_updates()?;

        let message = format!("Merged {other_branch} into {current_branch}.");
        self.write_commit(&mut index, vec![head_oid, other_oid], &message)?;

        if plan.has_conflicts() {
            writeln!(self.writer(), "{CONFLICT_NOTICE}")?;
        }

        Ok(())
    }

    fn find_split_point(&self, head_oid: &ObjectId, other_oid: &ObjectId) -> anyhow::Result<ObjectId> {
        let mut graph = self.graph()?;
        let database = self.database();

        let split_oid = {
            let mut finder =
                SplitPointFinder::new(|oid: &ObjectId| graph.slim_commit(oid, database));
            finder.find(head_oid, other_oid)?
        }
        .with_context(|| format!("commits {head_oid} and {other_oid} share no history"))?;

        debug_assert!(
            graph.ancestors(head_oid).contains(&split_oid)
                && graph.ancestors(other_oid).contains(&split_oid),
            "split point {split_oid} is not a common ancestor"
        );
        tracing::debug!(reachable = graph.bfs(head_oid).len(), "searched commit graph");

        Ok(split_oid)
    }

    fn apply_merge_plan(&self, index: &mut Index, head: &Commit, plan: &MergePlan) -> anyhow::Result<()> {
        for (name, outcome) in plan.outcomes() {
            match outcome {
                MergeOutcome::Keep => {}
                MergeOutcome::Checkout(oid) | MergeOutcome::Create(oid) => {
                    let blob = self.database().load_blob(oid)?;
                    self.workspace().write_file(name, blob.content())?;
                    self.stage_blob(index, head, name, &blob)?;
                }
                MergeOutcome::Delete => {
                    if let Some(tracked_oid) = head.blob(name) {
                        index.stage_removal(name, tracked_oid.clone())?;
                    }
                    self.workspace().remove_file(name)?;
                }
                MergeOutcome::RestoreHead(oid) => {
                    let blob = self.database().load_blob(oid)?;
                    self.workspace().write_file(name, blob.content())?;
                }
                MergeOutcome::Conflict {
                    head: head_oid,
                    other: other_oid,
                } => {
                    let head_blob = self.database().load_blob(head_oid)?;
                    let other_blob = self.database().load_blob(other_oid)?;
                    let blob = Blob::new(conflict_content(head_blob.content(), other_blob.content()));

                    self.workspace().write_file(name, blob.content())?;
                    self.stage_blob(index, head, name, &blob)?;
                    tracing::debug!(file = %name, "merge conflict");
                }
            }
        }

        Ok(())
    }
}
