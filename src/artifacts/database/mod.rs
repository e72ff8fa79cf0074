//! Content-addressed object storage
//!
//! An [`ObjectStore`] keeps immutable, framed objects (`<type> <size>\0<content>`)
//! under the SHA-1 digest of their bytes. Stores are append-only: there is no
//! update and no delete, and storing the same bytes twice is a no-op.
//!
//! Two implementations are provided:
//!
//! - [`fs_store::FsObjectStore`]: zlib-compressed files fanned out as `xx/yyyy…`
//! - [`memory_store::MemoryObjectStore`]: a map kept in memory, for tests

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use std::fmt::Debug;

pub mod fs_store;
pub mod memory_store;

pub trait ObjectStore: Debug + Send + Sync {
    /// Kind of object kept in this namespace
    fn kind(&self) -> ObjectType;

    /// Store `content` under its digest and return the digest
    fn put(&self, content: Bytes) -> anyhow::Result<ObjectId>;

    /// Fails with `BitletError::ObjectNotFound` if nothing is stored under `object_id`
    fn get(&self, object_id: &ObjectId) -> anyhow::Result<Bytes>;

    fn contains(&self, object_id: &ObjectId) -> bool;

    /// Every stored id, in ascending order
    fn list(&self) -> anyhow::Result<Vec<ObjectId>>;

    /// Every stored id starting with the hexadecimal `prefix`, in ascending order
    fn find_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|object_id| object_id.starts_with(prefix))
            .collect())
    }
}
