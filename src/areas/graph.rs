//! Commit graph
//!
//! A derived index of parent links, kept so history queries do not have to
//! inflate every commit object. Each line of the `graph` file names a commit
//! followed by its parents:
//!
//! ```text
//! <commit> [<first-parent> [<second-parent>]]
//! ```
//!
//! The object database stays authoritative. Whenever the file is missing,
//! unreadable or lacks a queried commit, the graph is rebuilt from the
//! parent links of every stored commit.

use crate::areas::database::Database;
use crate::artifacts::objects::commit::{Commit, SlimCommit};
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use fake::rand;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::io::Write;
use std::path::Path;

pub const GRAPH_FILE_NAME: &str = "graph";

#[derive(Debug, Clone)]
pub struct CommitGraph {
    /// Path to the graph file (`.bitlet/graph`)
    path: Box<Path>,
    parents: BTreeMap<ObjectId, Vec<ObjectId>>,
    children: BTreeMap<ObjectId, BTreeSet<ObjectId>>,
}

impl CommitGraph {
    pub fn new(path: Box<Path>) -> Self {
        CommitGraph {
            path,
            parents: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    /// Read the graph file, rebuilding it from `database` if it cannot be used
    pub fn load(path: Box<Path>, database: &Database) -> anyhow::Result<Self> {
        let mut graph = Self::new(path);

        match graph.read() {
            Ok(true) => Ok(graph),
            Ok(false) => {
                graph.rebuild(database)?;
                Ok(graph)
            }
            Err(error) => {
                tracing::warn!(%error, "commit graph is unreadable, rebuilding");
                graph.rebuild(database)?;
                Ok(graph)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.parents.contains_key(oid)
    }

    pub fn parents(&self, oid: &ObjectId) -> Option<&[ObjectId]> {
        self.parents.get(oid).map(Vec::as_slice)
    }

    /// Register a written commit: one vertex and an edge per parent
    pub fn add_commit(&mut self, commit: &Commit) -> anyhow::Result<()> {
        let oid = commit
            .oid()
            .context("cannot add an unwritten commit to the graph")?;

        self.add_vertex(oid.clone(), commit.parents().to_vec());
        Ok(())
    }

    fn add_vertex(&mut self, oid: ObjectId, parents: Vec<ObjectId>) {
        for parent in &parents {
            self.children
                .entry(parent.clone())
                .or_default()
                .insert(oid.clone());
        }
        self.children.entry(oid.clone()).or_default();
        self.parents.insert(oid, parents);
    }

    /// Make sure `oid` is a vertex, rebuilding the graph from `database` otherwise
    pub fn ensure(&mut self, oid: &ObjectId, database: &Database) -> anyhow::Result<()> {
        if self.contains(oid) {
            return Ok(());
        }

        tracing::debug!(commit = %oid, "commit missing from graph, rebuilding");
        self.rebuild(database)?;

        if self.contains(oid) {
            Ok(())
        } else {
            anyhow::bail!("commit {oid} is not in the object database")
        }
    }

    /// Parent links of `oid` as a slim commit, rebuilding the graph if needed
    pub fn slim_commit(&mut self, oid: &ObjectId, database: &Database) -> anyhow::Result<SlimCommit> {
        self.ensure(oid, database)?;

        Ok(SlimCommit {
            oid: oid.clone(),
            parents: self.parents(oid).map(<[ObjectId]>::to_vec).unwrap_or_default(),
        })
    }

    pub fn rebuild(&mut self, database: &Database) -> anyhow::Result<()> {
        self.parents.clear();
        self.children.clear();

        for oid in database.commit_ids()? {
            let slim_commit = database.load_slim_commit(&oid)?;
            self.add_vertex(slim_commit.oid, slim_commit.parents);
        }

        tracing::info!(commits = self.parents.len(), "rebuilt commit graph");
        self.persist()
    }

    /// Breadth-first discovery order from `from`, following edges in both directions
    ///
    /// Only commits already in the graph are visited.
    pub(crate) fn bfs(&self, from: &ObjectId) -> Vec<ObjectId> {
        let mut order = Vec::new();
        if !self.contains(from) {
            return order;
        }

        let mut visited = HashSet::from([from.clone()]);
        let mut queue = VecDeque::from([from.clone()]);

        while let Some(oid) = queue.pop_front() {
            let parents = self.parents.get(&oid).into_iter().flatten();
            let children = self.children.get(&oid).into_iter().flatten();

            for neighbour in parents.chain(children) {
                if visited.insert(neighbour.clone()) {
                    queue.push_back(neighbour.clone());
                }
            }
            order.push(oid);
        }

        order
    }

    /// `from` and every commit reachable through parent edges
    pub(crate) fn ancestors(&self, from: &ObjectId) -> BTreeSet<ObjectId> {
        let mut ancestors = BTreeSet::new();
        let mut queue = VecDeque::from([from.clone()]);

        while let Some(oid) = queue.pop_front() {
            if !ancestors.insert(oid.clone()) {
                continue;
            }
            for parent in self.parents.get(&oid).into_iter().flatten() {
                queue.push_back(parent.clone());
            }
        }

        ancestors
    }

    /// Returns `Ok(false)` when there is no graph file yet
    fn read(&mut self) -> anyhow::Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read commit graph at {:?}", self.path))?;

        for line in content.lines().filter(|line| !line.trim().is_empty()) {
            let mut oids = line
                .split_whitespace()
                .map(|oid| ObjectId::try_parse(oid.to_string()));
            let oid = oids.next().context("empty commit graph line")??;
            let parents = oids.collect::<anyhow::Result<Vec<_>>>()?;

            if parents.len() > 2 {
                anyhow::bail!("commit {oid} has more than two parents in the graph");
            }
            self.add_vertex(oid, parents);
        }

        Ok(true)
    }

    pub fn persist(&self) -> anyhow::Result<()> {
        let dir = self
            .path
            .parent()
            .with_context(|| format!("invalid commit graph path {:?}", self.path))?;
        let temp_path = dir.join(format!("tmp-graph-{}", rand::random::<u32>()));

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .with_context(|| format!("failed to open {:?}", temp_path))?;

        for (oid, parents) in &self.parents {
            let mut line = oid.to_string();
            for parent in parents {
                line.push(' ');
                line.push_str(parent.as_ref());
            }
            line.push('\n');
            file.write_all(line.as_bytes())?;
        }
        file.sync_all()?;

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("failed to rename commit graph to {:?}", self.path))?;

        Ok(())
    }
}
