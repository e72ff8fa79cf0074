//! Split point (merge base) finder
//!
//! The split point of two commits is their best common ancestor:
//!
//! > A best common ancestor of commits X and Y is any common ancestor of X and Y
//! > that is not an ancestor of any other common ancestor.
//!
//! ## Algorithm
//!
//! ### Phase 1: Mark ancestors
//!
//! A breadth-first walk over parent edges from each tip marks every reachable
//! commit as visited from the source side, the target side, or both, and
//! records its shortest distance from each tip. Commits visited from both
//! sides are the common ancestors (`RESULT`).
//!
//! ### Phase 2: Drop redundant ancestors
//!
//! Walking the parents of every common ancestor marks the common ancestors
//! it reaches as `STALE`: they are proper ancestors of another common
//! ancestor and therefore not best.
//!
//! ### Phase 3: Pick one
//!
//! Criss-cross histories leave several best common ancestors. The one with
//! the smallest summed distance from the two tips wins, ties broken by id.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut finder = SplitPointFinder::new(|commit_id| graph.slim_commit(commit_id, &database));
//!
//! let split_point = finder.find(&head, &other)?;
//! ```

use crate::artifacts::objects::commit::SlimCommit;
use crate::artifacts::objects::object_id::ObjectId;
use bitflags::bitflags;
use std::collections::{HashMap, VecDeque};
use std::fmt;

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    struct VisitState: u8 {
        const NONE = 0b00;
        const VISITED_FROM_SOURCE = 0b01;
        const VISITED_FROM_TARGET = 0b10;
        const VISITED_FROM_BOTH = Self::VISITED_FROM_SOURCE.bits() | Self::VISITED_FROM_TARGET.bits();
        const STALE = 0b100; // proper ancestor of another common ancestor
        const RESULT = 0b1000; // common ancestor
    }
}

impl fmt::Debug for VisitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = Vec::new();
        if self.contains(VisitState::VISITED_FROM_SOURCE) {
            flags.push("SOURCE");
        }
        if self.contains(VisitState::VISITED_FROM_TARGET) {
            flags.push("TARGET");
        }
        if self.contains(VisitState::STALE) {
            flags.push("STALE");
        }
        if self.contains(VisitState::RESULT) {
            flags.push("RESULT");
        }
        if flags.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", flags.join("|"))
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Visit {
    state: VisitState,
    source_distance: usize,
    target_distance: usize,
}

impl Visit {
    fn summed_distance(&self) -> usize {
        self.source_distance + self.target_distance
    }
}

/// Finds the split point of two commits
///
/// # Type Parameters
///
/// * `CommitLoaderFn` - Loads the parent links of a commit. Any backend works:
///   the commit graph, the object database or an in-memory map in tests.
pub struct SplitPointFinder<CommitLoaderFn>
where
    CommitLoaderFn: FnMut(&ObjectId) -> anyhow::Result<SlimCommit>,
{
    commit_loader: CommitLoaderFn,
    /// Parents of every commit loaded so far
    parents: HashMap<ObjectId, Vec<ObjectId>>,
}

impl<CommitLoaderFn> SplitPointFinder<CommitLoaderFn>
where
    CommitLoaderFn: FnMut(&ObjectId) -> anyhow::Result<SlimCommit>,
{
    pub fn new(commit_loader: CommitLoaderFn) -> Self {
        Self {
            commit_loader,
            parents: HashMap::new(),
        }
    }

    /// The best common ancestor of `source_commit_id` and `target_commit_id`
    ///
    /// Returns `None` only for commits without any shared history. If one tip
    /// is an ancestor of the other, that tip is returned.
    pub fn find(
        &mut self,
        source_commit_id: &ObjectId,
        target_commit_id: &ObjectId,
    ) -> anyhow::Result<Option<ObjectId>> {
        if source_commit_id == target_commit_id {
            return Ok(Some(source_commit_id.clone()));
        }

        let mut visits = HashMap::<ObjectId, Visit>::new();
        self.mark_ancestors(source_commit_id, VisitState::VISITED_FROM_SOURCE, &mut visits)?;
        self.mark_ancestors(target_commit_id, VisitState::VISITED_FROM_TARGET, &mut visits)?;

        let mut common_ancestors = Vec::new();
        for (oid, visit) in visits.iter_mut() {
            if visit.state.contains(VisitState::VISITED_FROM_BOTH) {
                visit.state |= VisitState::RESULT;
                common_ancestors.push(oid.clone());
            }
        }
        common_ancestors.sort();

        tracing::debug!(
            source = %source_commit_id,
            target = %target_commit_id,
            common = common_ancestors.len(),
            "marked ancestors"
        );

        for common_ancestor in &common_ancestors {
            self.mark_stale_ancestors(common_ancestor, &mut visits)?;
        }

        let best = common_ancestors
            .iter()
            .filter_map(|oid| visits.get(oid).map(|visit| (oid, *visit)))
            .filter(|(_, visit)| !visit.state.contains(VisitState::STALE))
            .inspect(|(oid, visit)| {
                tracing::debug!(
                    commit = %oid,
                    state = ?visit.state,
                    distance = visit.summed_distance(),
                    "best common ancestor candidate"
                )
            })
            .min_by(|(a_oid, a), (b_oid, b)| {
                a.summed_distance()
                    .cmp(&b.summed_distance())
                    .then_with(|| a_oid.cmp(b_oid))
            })
            .map(|(oid, _)| oid.clone());

        Ok(best)
    }

    fn parents_of(&mut self, commit_id: &ObjectId) -> anyhow::Result<Vec<ObjectId>> {
        if let Some(parents) = self.parents.get(commit_id) {
            return Ok(parents.clone());
        }

        let slim_commit = (self.commit_loader)(commit_id)?;
        self.parents
            .insert(commit_id.clone(), slim_commit.parents.clone());

        Ok(slim_commit.parents)
    }

    fn mark_ancestors(
        &mut self,
        tip: &ObjectId,
        side: VisitState,
        visits: &mut HashMap<ObjectId, Visit>,
    ) -> anyhow::Result<()> {
        let mut queue = VecDeque::from([(tip.clone(), 0usize)]);

        while let Some((commit_id, distance)) = queue.pop_front() {
            let visit = visits.entry(commit_id.clone()).or_insert(Visit {
                state: VisitState::NONE,
                source_distance: usize::MAX,
                target_distance: usize::MAX,
            });
            if visit.state.contains(side) {
                continue;
            }

            visit.state |= side;
            if side == VisitState::VISITED_FROM_SOURCE {
                visit.source_distance = distance;
            } else {
                visit.target_distance = distance;
            }

            for parent_id in self.parents_of(&commit_id)? {
                queue.push_back((parent_id, distance + 1));
            }
        }

        Ok(())
    }

    fn mark_stale_ancestors(
        &mut self,
        common_ancestor: &ObjectId,
        visits: &mut HashMap<ObjectId, Visit>,
    ) -> anyhow::Result<()> {
        let mut queue = VecDeque::from(self.parents_of(common_ancestor)?);

        while let Some(commit_id) = queue.pop_front() {
            // every ancestor of a common ancestor is itself common, so it is in `visits`
            let Some(visit) = visits.get_mut(&commit_id) else {
                continue;
            };
            if visit.state.contains(VisitState::STALE) {
                continue;
            }

            visit.state |= VisitState::STALE;
            queue.extend(self.parents_of(&commit_id)?);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    /// In-memory commit store for testing
    #[derive(Debug, Clone, Default)]
    struct InMemoryCommitStore {
        commits: HashMap<ObjectId, Vec<ObjectId>>,
    }

    impl InMemoryCommitStore {
        fn add_commit(&mut self, name: &str, parents: &[&str]) -> &mut Self {
            self.commits.insert(
                create_oid(name),
                parents.iter().map(|parent| create_oid(parent)).collect(),
            );
            self
        }

        fn get_slim_commit(&self, commit_id: &ObjectId) -> anyhow::Result<SlimCommit> {
            let parents = self
                .commits
                .get(commit_id)
                .ok_or_else(|| anyhow::anyhow!("commit {commit_id} not found in test store"))?;

            Ok(SlimCommit {
                oid: commit_id.clone(),
                parents: parents.clone(),
            })
        }

        fn split_point(&self, source: &str, target: &str) -> Option<ObjectId> {
            SplitPointFinder::new(|commit_id| self.get_slim_commit(commit_id))
                .find(&create_oid(source), &create_oid(target))
                .unwrap()
        }
    }

    /// Deterministic 40-character hex id built from the commit name
    fn create_oid(id: &str) -> ObjectId {
        let mut hex_string = id
            .as_bytes()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>();

        while hex_string.len() < 40 {
            hex_string.push('0');
        }
        hex_string.truncate(40);

        ObjectId::try_parse(hex_string).expect("Invalid test ObjectId")
    }

    /// root <- a <- b <- c <- d
    #[fixture]
    fn linear_history() -> InMemoryCommitStore {
        let mut store = InMemoryCommitStore::default();
        store
            .add_commit("root", &[])
            .add_commit("a", &["root"])
            .add_commit("b", &["a"])
            .add_commit("c", &["b"])
            .add_commit("d", &["c"]);
        store
    }

    /// root <- a <- b, a <- c <- e
    #[fixture]
    fn branching() -> InMemoryCommitStore {
        let mut store = InMemoryCommitStore::default();
        store
            .add_commit("root", &[])
            .add_commit("a", &["root"])
            .add_commit("b", &["a"])
            .add_commit("c", &["a"])
            .add_commit("e", &["c"]);
        store
    }

    /// a <- b, a <- c, m = merge(b, c), b <- f
    #[fixture]
    fn diamond() -> InMemoryCommitStore {
        let mut store = InMemoryCommitStore::default();
        store
            .add_commit("a", &[])
            .add_commit("b", &["a"])
            .add_commit("c", &["a"])
            .add_commit("m", &["b", "c"])
            .add_commit("f", &["b"])
            .add_commit("n", &["m"]);
        store
    }

    /// a <- b, a <- c, d = merge(b, c), e = merge(c, b), d <- f, e <- g
    #[fixture]
    fn criss_cross() -> InMemoryCommitStore {
        let mut store = InMemoryCommitStore::default();
        store
            .add_commit("a", &[])
            .add_commit("b", &["a"])
            .add_commit("c", &["a"])
            .add_commit("d", &["b", "c"])
            .add_commit("e", &["c", "b"])
            .add_commit("f", &["d"])
            .add_commit("g", &["e"]);
        store
    }

    #[rstest]
    fn ancestor_tip_is_the_split_point(linear_history: InMemoryCommitStore) {
        assert_eq!(linear_history.split_point("b", "d"), Some(create_oid("b")));
        assert_eq!(linear_history.split_point("d", "b"), Some(create_oid("b")));
    }

    #[rstest]
    fn same_commit_is_its_own_split_point(linear_history: InMemoryCommitStore) {
        assert_eq!(linear_history.split_point("c", "c"), Some(create_oid("c")));
    }

    #[rstest]
    fn diverged_branches_split_at_the_fork(branching: InMemoryCommitStore) {
        assert_eq!(branching.split_point("b", "c"), Some(create_oid("a")));
        assert_eq!(branching.split_point("b", "e"), Some(create_oid("a")));
    }

    #[rstest]
    fn merged_side_becomes_the_new_split_point(diamond: InMemoryCommitStore) {
        // after merging c into b's line, further work on b splits at b
        assert_eq!(diamond.split_point("f", "n"), Some(create_oid("b")));
        assert_eq!(diamond.split_point("c", "n"), Some(create_oid("c")));
    }

    #[rstest]
    fn criss_cross_picks_one_best_ancestor_deterministically(criss_cross: InMemoryCommitStore) {
        let expected = create_oid("b").min(create_oid("c"));

        assert_eq!(criss_cross.split_point("f", "g"), Some(expected.clone()));
        assert_eq!(criss_cross.split_point("g", "f"), Some(expected));
    }

    #[test]
    fn unrelated_histories_have_no_split_point() {
        let mut store = InMemoryCommitStore::default();
        store
            .add_commit("x", &[])
            .add_commit("y", &[])
            .add_commit("x1", &["x"]);

        assert_eq!(store.split_point("x1", "y"), None);
    }

    #[test]
    fn loader_errors_are_propagated() {
        let store = InMemoryCommitStore::default();

        let result = SplitPointFinder::new(|commit_id| store.get_slim_commit(commit_id))
            .find(&create_oid("ghost"), &create_oid("other"));

        assert!(result.is_err());
    }
}
