//! Branch pointers and HEAD
//!
//! Every branch is a file under `refs/heads/` holding the 40-character id of
//! its tip commit. `HEAD` is a symbolic ref naming the active branch:
//!
//! ```text
//! ref: refs/heads/master
//! ```
//!
//! Ref files are locked with `file_guard` while they are read or written.

use crate::artifacts::branch::branch_name::{BranchName, REF_PREFIX};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::BitletError;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::io::{Read, Write};
use std::ops::DerefMut;
use std::path::Path;
use walkdir::WalkDir;

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (.+)$";

#[derive(Debug, new)]
pub struct Refs {
    /// Path to the metadata directory (`.bitlet`)
    path: Box<Path>,
}

impl Refs {
    /// Branch HEAD points at
    pub fn current_branch(&self) -> anyhow::Result<BranchName> {
        let content = Self::read_ref_file(&self.head_path())?
            .with_context(|| format!("HEAD is missing at {:?}", self.head_path()))?;

        let symref_match = regex::Regex::new(SYMREF_REGEX)?
            .captures(&content)
            .with_context(|| format!("HEAD is not a symbolic ref: {content}"))?;

        BranchName::try_parse_ref_path(&symref_match[1])
    }

    pub fn is_current_branch(&self, branch_name: &BranchName) -> anyhow::Result<bool> {
        Ok(&self.current_branch()? == branch_name)
    }

    pub fn set_head(&self, branch_name: &BranchName) -> anyhow::Result<()> {
        Self::write_ref_file(
            &self.head_path(),
            &format!("ref: {}", branch_name.to_ref_path()),
        )
    }

    /// Tip of the current branch
    pub fn read_head(&self) -> anyhow::Result<ObjectId> {
        let current_branch = self.current_branch()?;

        self.read_branch(&current_branch)?
            .with_context(|| format!("current branch {current_branch} has no commit"))
    }

    /// Advance the current branch to `oid`
    pub fn update_head(&self, oid: &ObjectId) -> anyhow::Result<()> {
        let current_branch = self.current_branch()?;
        self.update_branch(&current_branch, oid)?;

        tracing::info!(branch = %current_branch, commit = %oid, "advanced branch");
        Ok(())
    }

    pub fn read_branch(&self, branch_name: &BranchName) -> anyhow::Result<Option<ObjectId>> {
        match Self::read_ref_file(&self.branch_path(branch_name))? {
            Some(content) => Ok(Some(ObjectId::try_parse(content)?)),
            None => Ok(None),
        }
    }

    pub fn branch_exists(&self, branch_name: &BranchName) -> bool {
        self.branch_path(branch_name).is_file()
    }

    /// Point `branch_name` at `oid`, creating the branch if needed
    pub fn update_branch(&self, branch_name: &BranchName, oid: &ObjectId) -> anyhow::Result<()> {
        Self::write_ref_file(&self.branch_path(branch_name), oid.as_ref())
    }

    pub fn create_branch(&self, branch_name: &BranchName, oid: &ObjectId) -> anyhow::Result<()> {
        if self.branch_exists(branch_name) {
            return Err(BitletError::BranchAlreadyExists.into());
        }

        self.update_branch(branch_name, oid)
    }

    /// Remove the pointer only; commits stay in the database
    pub fn delete_branch(&self, branch_name: &BranchName) -> anyhow::Result<ObjectId> {
        let branch_path = self.branch_path(branch_name);
        let oid = self
            .read_branch(branch_name)?
            .ok_or(BitletError::BranchNotFound)?;

        std::fs::remove_file(&branch_path)
            .with_context(|| format!("failed to delete branch file at {:?}", branch_path))?;
        self.prune_branch_empty_parent_dirs(&branch_path)?;

        Ok(oid)
    }

    /// All branches, sorted by name
    pub fn list_branches(&self) -> anyhow::Result<Vec<BranchName>> {
        let heads_path = self.heads_path();
        let mut branches = WalkDir::new(&heads_path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative_path = entry.path().strip_prefix(&heads_path).ok()?;
                let name = relative_path.to_string_lossy().replace('\\', "/");
                BranchName::try_parse(name).ok()
            })
            .collect::<Vec<_>>();

        branches.sort();
        Ok(branches)
    }

    pub fn head_path(&self) -> Box<Path> {
        self.path.join(HEAD_REF_NAME).into_boxed_path()
    }

    pub fn heads_path(&self) -> Box<Path> {
        self.path.join(REF_PREFIX).into_boxed_path()
    }

    fn branch_path(&self, branch_name: &BranchName) -> Box<Path> {
        self.heads_path().join(branch_name.as_ref()).into_boxed_path()
    }

    fn read_ref_file(path: &Path) -> anyhow::Result<Option<String>> {
        if !path.is_file() {
            return Ok(None);
        }

        let mut ref_file = std::fs::OpenOptions::new()
            .read(true)
            .open(path)
            .with_context(|| format!("failed to open ref file at {:?}", path))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Shared, 0, 1)?;

        let mut content = String::new();
        lock.deref_mut()
            .read_to_string(&mut content)
            .with_context(|| format!("failed to read ref file at {:?}", path))?;
        let content = content.trim();

        if content.is_empty() {
            Ok(None)
        } else {
            Ok(Some(content.to_string()))
        }
    }

    fn write_ref_file(path: &Path, raw_ref: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(path.parent().with_context(|| {
            format!(
                "failed to create parent directories for ref file at {:?}",
                path
            )
        })?)?;

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("failed to open ref file at {:?}", path))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;
        lock.deref_mut().write_all(raw_ref.as_bytes())?;

        Ok(())
    }

    fn prune_branch_empty_parent_dirs(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent()
            && parent != self.heads_path().as_ref()
            && parent.read_dir()?.next().is_none()
        {
            std::fs::remove_dir(parent).with_context(|| {
                format!("failed to remove empty branch directory at {:?}", parent)
            })?;
            self.prune_branch_empty_parent_dirs(parent)?;
        }

        Ok(())
    }
}
