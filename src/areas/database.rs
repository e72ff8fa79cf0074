use crate::artifacts::database::ObjectStore;
use crate::artifacts::database::fs_store::FsObjectStore;
use crate::artifacts::database::memory_store::MemoryObjectStore;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::{Commit, SlimCommit};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use std::io::{BufRead, Cursor};
use std::path::Path;

/// Blob and commit namespaces of the object database
#[derive(Debug)]
pub struct Database {
    blobs: Box<dyn ObjectStore>,
    commits: Box<dyn ObjectStore>,
}

impl Database {
    /// File-backed database rooted at `.bitlet/objects`
    pub fn new(path: Box<Path>) -> Self {
        Database {
            blobs: Box::new(FsObjectStore::new(
                ObjectType::Blob,
                path.join("blobs").into_boxed_path(),
            )),
            commits: Box::new(FsObjectStore::new(
                ObjectType::Commit,
                path.join("commits").into_boxed_path(),
            )),
        }
    }

    pub fn in_memory() -> Self {
        Database {
            blobs: Box::new(MemoryObjectStore::new(ObjectType::Blob)),
            commits: Box::new(MemoryObjectStore::new(ObjectType::Commit)),
        }
    }

    pub fn store_blob(&self, blob: &Blob) -> anyhow::Result<ObjectId> {
        self.blobs.put(blob.serialize()?)
    }

    /// Persist `commit` and assign it its id
    pub fn store_commit(&self, commit: &mut Commit) -> anyhow::Result<ObjectId> {
        let object_id = self.commits.put(commit.serialize()?)?;
        commit.set_oid(object_id.clone());

        Ok(object_id)
    }

    pub fn load_blob(&self, object_id: &ObjectId) -> anyhow::Result<Blob> {
        let object_reader = Self::open(self.blobs.as_ref(), object_id)?;
        Blob::deserialize(object_reader)
    }

    pub fn load_commit(&self, object_id: &ObjectId) -> anyhow::Result<Commit> {
        let object_reader = Self::open(self.commits.as_ref(), object_id)?;
        Ok(Commit::deserialize(object_reader)?.with_oid(object_id.clone()))
    }

    pub fn load_slim_commit(&self, object_id: &ObjectId) -> anyhow::Result<SlimCommit> {
        self.load_commit(object_id)?.to_slim()
    }

    pub fn contains_blob(&self, object_id: &ObjectId) -> bool {
        self.blobs.contains(object_id)
    }

    pub fn contains_commit(&self, object_id: &ObjectId) -> bool {
        self.commits.contains(object_id)
    }

    pub fn commit_ids(&self) -> anyhow::Result<Vec<ObjectId>> {
        self.commits.list()
    }

    pub fn find_commits_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        self.commits.find_by_prefix(prefix)
    }

    /// Every stored commit, ids assigned
    pub fn load_all_commits(&self) -> anyhow::Result<Vec<Commit>> {
        self.commit_ids()?
            .iter()
            .map(|object_id| self.load_commit(object_id))
            .collect()
    }

    /// Read a framed object and position the reader right after its header
    fn open(store: &dyn ObjectStore, object_id: &ObjectId) -> anyhow::Result<impl BufRead> {
        let object_content: Bytes = store.get(object_id)?;
        let total_length = object_content.len();
        let mut object_reader = Cursor::new(object_content);

        let (object_type, size) = ObjectType::parse_header(&mut object_reader)?;
        if object_type != store.kind() {
            anyhow::bail!(
                "object {} is a {} where a {} was expected",
                object_id,
                object_type,
                store.kind()
            );
        }
        if total_length - object_reader.position() as usize != size {
            anyhow::bail!("object {object_id} is truncated");
        }

        Ok(object_reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::commit::BlobMapping;
    use crate::artifacts::objects::object::Object;
    use crate::errors::BitletError;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::memory(None)]
    #[case::filesystem(Some(TempDir::new().unwrap()))]
    fn written_commit_reads_back_identically(#[case] dir: Option<TempDir>) {
        let database = match &dir {
            Some(dir) => Database::new(dir.path().join("objects").into_boxed_path()),
            None => Database::in_memory(),
        };
        let blob = Blob::new(Bytes::from_static(b"hello"));
        let blob_id = database.store_blob(&blob).unwrap();
        assert_eq!(blob_id, blob.object_id().unwrap());

        let mut root = Commit::root();
        let root_id = database.store_commit(&mut root).unwrap();
        let mut commit = Commit::new(
            vec![root_id.clone()],
            BlobMapping::from([("f.txt".to_string(), blob_id.clone())]),
            "first".to_string(),
            Commit::root().timestamp(),
        );
        let commit_id = database.store_commit(&mut commit).unwrap();

        assert_eq!(commit.oid(), Some(&commit_id));
        assert_eq!(database.load_commit(&commit_id).unwrap(), commit);
        assert_eq!(database.load_blob(&blob_id).unwrap(), blob);
        assert_eq!(database.commit_ids().unwrap().len(), 2);
        assert_eq!(
            database.load_slim_commit(&commit_id).unwrap().parents,
            vec![root_id]
        );
    }

    #[test]
    fn namespaces_are_separate() {
        let database = Database::in_memory();
        let blob_id = database
            .store_blob(&Blob::new(Bytes::from_static(b"x")))
            .unwrap();

        let error = database.load_commit(&blob_id).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<BitletError>(),
            Some(BitletError::ObjectNotFound(ObjectType::Commit, _))
        ));
        assert!(!database.contains_commit(&blob_id));
        assert!(database.contains_blob(&blob_id));
    }
}
