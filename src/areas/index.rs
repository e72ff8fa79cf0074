//! Staging index
//!
//! The staging index bridges the working directory and the next commit. It
//! holds two mutually exclusive mappings:
//!
//! - `additions`: filename → id of the staged blob copy
//! - `removals`: filename → id of the blob the current commit tracks
//!
//! Staged blob copies live as raw files under `stage/blobs/<oid>` until the
//! next commit relocates them into the object database.

use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{IndexEntry, NAME_LENGTH_SIZE, OID_SIZE};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::HEADER_SIZE;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use byteorder::ByteOrder;
use bytes::Bytes;
use fake::rand;
use std::collections::BTreeMap;
use std::io::Write;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

pub const INDEX_FILE_NAME: &str = "index";
pub const STAGED_BLOBS_DIR: &str = "blobs";

#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the stage directory (`.bitlet/stage`)
    path: Box<Path>,
    additions: BTreeMap<String, ObjectId>,
    removals: BTreeMap<String, ObjectId>,
    /// Set when the mappings differ from what is on disk
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            additions: BTreeMap::new(),
            removals: BTreeMap::new(),
            changed: false,
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.path.join(INDEX_FILE_NAME)
    }

    pub fn blobs_path(&self) -> PathBuf {
        self.path.join(STAGED_BLOBS_DIR)
    }

    pub fn additions(&self) -> &BTreeMap<String, ObjectId> {
        &self.additions
    }

    pub fn removals(&self) -> &BTreeMap<String, ObjectId> {
        &self.removals
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    pub fn is_staged_for_addition(&self, name: &str) -> bool {
        self.additions.contains_key(name)
    }

    pub fn is_staged_for_removal(&self, name: &str) -> bool {
        self.removals.contains_key(name)
    }

    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Load both mappings from disk
    ///
    /// A missing or empty index file is an empty index.
    ///
    /// # Locking
    ///
    /// Acquires a shared lock on the index file during reading.
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        self.additions.clear();
        self.removals.clear();
        self.changed = false;

        let index_path = self.index_path();
        if !index_path.exists() {
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new()
            .read(true)
            .open(&index_path)
            .with_context(|| format!("failed to open index file at {:?}", index_path))?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;

        if lock.deref_mut().metadata()?.len() == 0 {
            return Ok(());
        }

        let mut reader = Checksum::new(lock);
        let header = Self::parse_header(&mut reader)?;
        let additions = Self::parse_entries(header.additions_count, &mut reader)?;
        let removals = Self::parse_entries(header.removals_count, &mut reader)?;
        reader.verify()?;

        self.additions = additions;
        self.removals = removals;

        Ok(())
    }

    fn parse_header(reader: &mut Checksum) -> anyhow::Result<IndexHeader> {
        let header_bytes = reader.read(HEADER_SIZE)?;
        let header = IndexHeader::deserialize(std::io::Cursor::new(header_bytes))?;
        header.validate()?;

        Ok(header)
    }

    fn parse_entries(
        count: u32,
        reader: &mut Checksum,
    ) -> anyhow::Result<BTreeMap<String, ObjectId>> {
        let mut entries = BTreeMap::new();

        for _ in 0..count {
            let length_bytes = reader.read(NAME_LENGTH_SIZE)?;
            let name_length = byteorder::NetworkEndian::read_u16(&length_bytes) as usize;
            let rest = reader.read(name_length + OID_SIZE)?;

            let entry_bytes = Bytes::from([length_bytes.as_ref(), rest.as_ref()].concat());
            let entry = IndexEntry::deserialize(std::io::Cursor::new(entry_bytes))?;
            entries.insert(entry.name, entry.oid);
        }

        Ok(entries)
    }

    /// Persist both mappings
    ///
    /// # Locking
    ///
    /// Acquires an exclusive lock on the index file during writing.
    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        let index_path = self.index_path();
        std::fs::create_dir_all(&self.path)
            .with_context(|| format!("failed to create stage directory at {:?}", self.path))?;

        let mut index_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&index_path)
            .with_context(|| format!("failed to open index file at {:?}", index_path))?;
        let lock = file_guard::lock(&mut index_file, file_guard::Lock::Exclusive, 0, 1)?;

        let mut writer = Checksum::new(lock);

        let header = IndexHeader {
            additions_count: self.additions.len() as u32,
            removals_count: self.removals.len() as u32,
            ..IndexHeader::empty()
        };
        writer.write(&header.serialize()?)?;

        for (name, oid) in self.additions.iter().chain(self.removals.iter()) {
            let entry = IndexEntry::new(name.clone(), oid.clone());
            writer.write(&entry.serialize()?)?;
        }

        writer.write_checksum()?;
        self.changed = false;

        Ok(())
    }

    /// Record `name` as staged for addition with the staged copy `oid`
    pub fn stage_addition(&mut self, name: &str, oid: ObjectId) -> anyhow::Result<()> {
        self.removals.remove(name);
        if let Some(previous) = self.additions.insert(name.to_string(), oid) {
            self.discard_staged_blob_if_unused(&previous)?;
        }
        self.changed = true;

        Ok(())
    }

    /// Drop a pending addition and its staged copy
    pub fn unstage_addition(&mut self, name: &str) -> anyhow::Result<Option<ObjectId>> {
        let removed = self.additions.remove(name);
        if let Some(oid) = &removed {
            self.discard_staged_blob_if_unused(oid)?;
            self.changed = true;
        }

        Ok(removed)
    }

    /// Record `name` as staged for removal; `tracked_oid` is the blob the current commit tracks
    pub fn stage_removal(&mut self, name: &str, tracked_oid: ObjectId) -> anyhow::Result<()> {
        self.unstage_addition(name)?;
        self.removals.insert(name.to_string(), tracked_oid);
        self.changed = true;

        Ok(())
    }

    pub fn unstage_removal(&mut self, name: &str) -> Option<ObjectId> {
        let removed = self.removals.remove(name);
        if removed.is_some() {
            self.changed = true;
        }

        removed
    }

    /// Keep a raw copy of `content` until the next commit
    pub fn store_staged_blob(&self, oid: &ObjectId, content: &[u8]) -> anyhow::Result<()> {
        let blobs_path = self.blobs_path();
        let blob_path = blobs_path.join(oid.as_ref());
        if blob_path.exists() {
            return Ok(());
        }

        std::fs::create_dir_all(&blobs_path)
            .with_context(|| format!("failed to create staged blobs directory {:?}", blobs_path))?;
        let temp_path = blobs_path.join(format!("tmp-stage-{}", rand::random::<u32>()));

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .with_context(|| format!("failed to open staged blob {:?}", temp_path))?;
        file.write_all(content)?;
        file.sync_all()?;

        std::fs::rename(&temp_path, &blob_path)
            .with_context(|| format!("failed to rename staged blob to {:?}", blob_path))?;

        Ok(())
    }

    pub fn read_staged_blob(&self, oid: &ObjectId) -> anyhow::Result<Bytes> {
        let blob_path = self.blobs_path().join(oid.as_ref());
        let content = std::fs::read(&blob_path)
            .with_context(|| format!("staged copy {oid} is missing at {:?}", blob_path))?;

        Ok(Bytes::from(content))
    }

    /// Delete every staged copy and empty both mappings
    pub fn clear(&mut self) -> anyhow::Result<()> {
        let blobs_path = self.blobs_path();
        if blobs_path.exists() {
            std::fs::remove_dir_all(&blobs_path)
                .with_context(|| format!("failed to clear staged blobs at {:?}", blobs_path))?;
        }

        self.additions.clear();
        self.removals.clear();
        self.changed = true;

        Ok(())
    }

    fn discard_staged_blob_if_unused(&self, oid: &ObjectId) -> anyhow::Result<()> {
        if self.additions.values().any(|staged| staged == oid) {
            return Ok(());
        }

        let blob_path = self.blobs_path().join(oid.as_ref());
        if blob_path.exists() {
            std::fs::remove_file(&blob_path)
                .with_context(|| format!("failed to delete staged blob {:?}", blob_path))?;
        }

        Ok(())
    }
}
