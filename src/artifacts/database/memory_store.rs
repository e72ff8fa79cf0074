use crate::artifacts::database::ObjectStore;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::BitletError;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
pub struct MemoryObjectStore {
    kind: ObjectType,
    objects: Mutex<BTreeMap<ObjectId, Bytes>>,
}

impl MemoryObjectStore {
    pub fn new(kind: ObjectType) -> Self {
        MemoryObjectStore {
            kind,
            objects: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects().is_empty()
    }

    fn objects(&self) -> MutexGuard<'_, BTreeMap<ObjectId, Bytes>> {
        // the map is never left half-updated, so a poisoned lock is still usable
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ObjectStore for MemoryObjectStore {
    fn kind(&self) -> ObjectType {
        self.kind
    }

    fn put(&self, content: Bytes) -> anyhow::Result<ObjectId> {
        let object_id = ObjectId::digest(&content);
        self.objects().entry(object_id.clone()).or_insert(content);

        Ok(object_id)
    }

    fn get(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        self.objects()
            .get(object_id)
            .cloned()
            .ok_or_else(|| BitletError::ObjectNotFound(self.kind, object_id.to_string()).into())
    }

    fn contains(&self, object_id: &ObjectId) -> bool {
        self.objects().contains_key(object_id)
    }

    fn list(&self) -> anyhow::Result<Vec<ObjectId>> {
        Ok(self.objects().keys().cloned().collect())
    }
}
