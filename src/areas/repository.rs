use crate::areas::database::Database;
use crate::areas::graph::{CommitGraph, GRAPH_FILE_NAME};
use crate::areas::index::Index;
use crate::areas::lock::RepositoryLock;
use crate::areas::refs::Refs;
use crate::areas::workspace::{METADATA_DIR, Workspace};
use crate::artifacts::checkout::migration::Migration;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::BitletError;
use anyhow::Context;
use std::cell::{RefCell, RefMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

const OBJECTS_DIR: &str = "objects";
const STAGE_DIR: &str = "stage";

pub struct Repository {
    path: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    index: Arc<Mutex<Index>>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
    /// Loaded on first use, most commands never need it
    graph: RefCell<Option<CommitGraph>>,
}

impl Repository {
    pub fn new(path: &str, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        let path = Path::new(path);
        if !path.exists() {
            std::fs::create_dir_all(path)
                .with_context(|| format!("failed to create repository root {:?}", path))?;
        }
        let path = path.canonicalize()?;
        let metadata_path = path.join(METADATA_DIR);

        let index = Index::new(metadata_path.join(STAGE_DIR).into_boxed_path());
        let database = Database::new(metadata_path.join(OBJECTS_DIR).into_boxed_path());
        let workspace = Workspace::new(path.clone().into_boxed_path());
        let refs = Refs::new(metadata_path.into_boxed_path());

        Ok(Repository {
            path: path.into_boxed_path(),
            writer: RefCell::new(writer),
            index: Arc::new(Mutex::new(index)),
            database,
            workspace,
            refs,
            graph: RefCell::new(None),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.path.join(METADATA_DIR)
    }

    pub fn objects_path(&self) -> PathBuf {
        self.metadata_path().join(OBJECTS_DIR)
    }

    pub fn is_initialized(&self) -> bool {
        self.metadata_path().is_dir()
    }

    /// Fails with `InitializationMissing` outside of an initialized repository
    pub fn ensure_initialized(&self) -> anyhow::Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(BitletError::InitializationMissing.into())
        }
    }

    /// Exclusive lock on the repository, released when dropped
    pub fn lock(&self) -> anyhow::Result<RepositoryLock> {
        RepositoryLock::acquire(&self.metadata_path())
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn index(&self) -> Arc<Mutex<Index>> {
        self.index.clone()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    /// The commit graph, read from disk (or rebuilt) on first access
    pub fn graph(&'_ self) -> anyhow::Result<RefMut<'_, CommitGraph>> {
        let mut graph = self.graph.borrow_mut();
        if graph.is_none() {
            let graph_path = self.metadata_path().join(GRAPH_FILE_NAME);
            *graph = Some(CommitGraph::load(graph_path.into_boxed_path(), &self.database)?);
        }

        RefMut::filter_map(graph, Option::as_mut)
            .map_err(|_| anyhow::anyhow!("commit graph is not loaded"))
    }

    pub fn head_commit(&self) -> anyhow::Result<Commit> {
        let head_oid = self.refs.read_head()?;
        self.database.load_commit(&head_oid)
    }

    /// Stage `blob` as the new content of `name`
    ///
    /// Content equal to what `head` tracks cancels the pending addition
    /// instead, and any pending removal of `name` is dropped either way.
    pub(crate) fn stage_blob(
        &self,
        index: &mut Index,
        head: &Commit,
        name: &str,
        blob: &Blob,
    ) -> anyhow::Result<()> {
        let blob_oid = blob.object_id()?;

        if head.blob(name) == Some(&blob_oid) {
            index.unstage_addition(name)?;
            index.unstage_removal(name);
        } else {
            index.store_staged_blob(&blob_oid, blob.content())?;
            index.stage_addition(name, blob_oid)?;
        }

        Ok(())
    }

    /// Turn the staged changes into a commit on top of `parents[0]`
    ///
    /// Staged copies are moved into the object database first, then the
    /// commit is written and registered in the graph, then the current
    /// branch is advanced and the staging area emptied.
    pub(crate) fn write_commit(
        &self,
        index: &mut Index,
        parents: Vec<ObjectId>,
        message: &str,
    ) -> anyhow::Result<Commit> {
        let head_oid = parents
            .first()
            .context("a new commit needs at least one parent")?;
        let mut blobs = self.database.load_commit(head_oid)?.blobs().clone();

        for (name, staged_oid) in index.additions() {
            let blob = Blob::new(index.read_staged_blob(staged_oid)?);
            let blob_oid = self.database.store_blob(&blob)?;
            if &blob_oid != staged_oid {
                anyhow::bail!("staged copy of {name} is corrupt: expected {staged_oid}, got {blob_oid}");
            }
            blobs.insert(name.clone(), blob_oid);
        }
        for name in index.removals().keys() {
            blobs.remove(name);
        }

        let mut commit = Commit::new(
            parents,
            blobs,
            message.to_string(),
            Commit::timestamp_from_env()?,
        );
        let commit_oid = self.database.store_commit(&mut commit)?;

        {
            let mut graph = self.graph()?;
            graph.add_commit(&commit)?;
            graph.persist()?;
        }

        self.refs.update_head(&commit_oid)?;

        index.clear()?;
        index.write_updates()?;

        Ok(commit)
    }

    /// Replace the working copy of `from` with the snapshot of `to`
    ///
    /// Refuses with `UntrackedFileConflict` before touching anything if an
    /// untracked file would be overwritten. Empties the staging area.
    pub(crate) fn checkout_snapshot(
        &self,
        index: &mut Index,
        from: &Commit,
        to: &Commit,
    ) -> anyhow::Result<()> {
        let migration = Migration::between(&self.database, from.blobs(), to.blobs());
        migration.check_untracked(&self.workspace)?;

        self.workspace.apply_migration(&migration)?;

        index.clear()?;
        index.write_updates()?;

        Ok(())
    }
}
