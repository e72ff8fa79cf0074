use crate::artifacts::checkout::migration::{ActionType, Migration};
use crate::artifacts::objects::blob::Blob;
use crate::errors::BitletError;
use anyhow::Context;
use bytes::Bytes;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Name of the metadata directory, never part of the working copy
pub const METADATA_DIR: &str = ".bitlet";

const IGNORED_PATHS: [&str; 3] = [METADATA_DIR, ".", ".."];

/// The working directory
///
/// Files are addressed by their `/`-separated path relative to the root.
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Turn a command line path into a workspace file name
    ///
    /// `./a//b.txt` becomes `a/b.txt`. Paths escaping the root, pointing into
    /// the metadata directory or containing line breaks are rejected.
    pub fn normalize_name(name: &str) -> anyhow::Result<String> {
        if name.contains(['\n', '\r']) {
            anyhow::bail!("unsupported file name: {name:?}");
        }

        let mut components = Vec::new();
        for component in Path::new(name).components() {
            match component {
                Component::Normal(part) => components.push(part.to_string_lossy().to_string()),
                Component::CurDir => {}
                _ => anyhow::bail!("path {name:?} is outside the repository"),
            }
        }

        if components.is_empty() {
            return Err(BitletError::FileNotFound.into());
        }
        if components[0] == METADATA_DIR {
            anyhow::bail!("path {name:?} is inside the metadata directory");
        }

        Ok(components.join("/"))
    }

    /// Every file in the working directory, sorted
    pub fn list_files(&self) -> anyhow::Result<Vec<String>> {
        let mut files = WalkDir::new(&self.path)
            .into_iter()
            .filter_entry(|entry| !Self::is_ignored(entry.path(), &self.path))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| self.to_name(entry.path()))
            .collect::<Vec<_>>();

        files.sort();
        Ok(files)
    }

    fn is_ignored(path: &Path, root: &Path) -> bool {
        path.strip_prefix(root)
            .map(|relative| {
                relative.components().any(|component| {
                    if let Component::Normal(name) = component {
                        IGNORED_PATHS.contains(&name.to_string_lossy().as_ref())
                    } else {
                        false
                    }
                })
            })
            .unwrap_or(true)
    }

    fn to_name(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(self.path.as_ref()).ok()?;
        let parts = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>();

        Some(parts.join("/"))
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.file_path(name).is_file()
    }

    pub fn read_file(&self, name: &str) -> anyhow::Result<Bytes> {
        let file_path = self.file_path(name);
        if !file_path.is_file() {
            return Err(BitletError::FileNotFound.into());
        }

        let content = std::fs::read(&file_path)
            .with_context(|| format!("Failed to read file: {:?}", file_path))?;
        Ok(Bytes::from(content))
    }

    pub fn parse_blob(&self, name: &str) -> anyhow::Result<Blob> {
        Ok(Blob::new(self.read_file(name)?))
    }

    /// Write `data` to `name`, creating parent directories as needed
    ///
    /// An empty directory at `name` is replaced, a non-empty one is an error.
    pub fn write_file(&self, name: &str, data: &[u8]) -> anyhow::Result<()> {
        let file_path = self.file_path(name);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        // only an empty directory may give way to the file
        if file_path.is_dir() {
            std::fs::remove_dir(&file_path)
                .with_context(|| format!("Directory in the way of file: {:?}", name))?;
        }

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&file_path)
            .with_context(|| format!("Failed to open file: {:?}", name))?;
        file.write_all(data)
            .with_context(|| format!("Failed to write to file: {:?}", name))?;

        Ok(())
    }

    /// Delete `name` if present, then prune directories left empty
    pub fn remove_file(&self, name: &str) -> anyhow::Result<()> {
        let file_path = self.file_path(name);
        if !file_path.is_file() {
            return Ok(());
        }

        std::fs::remove_file(&file_path)
            .with_context(|| format!("Failed to remove file: {:?}", name))?;
        self.prune_empty_parent_dirs(&file_path)
    }

    fn prune_empty_parent_dirs(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent()
            && parent != self.path.as_ref()
            && parent.starts_with(self.path.as_ref())
            && parent.read_dir()?.next().is_none()
        {
            std::fs::remove_dir(parent)
                .with_context(|| format!("Failed to remove empty directory: {:?}", parent))?;
            self.prune_empty_parent_dirs(parent)?;
        }

        Ok(())
    }

    // Deletions go first so a file can replace a directory that only held deleted files.
    pub fn apply_migration(&self, migration: &Migration) -> anyhow::Result<()> {
        for action in [ActionType::Delete, ActionType::Modify, ActionType::Add] {
            self.apply_migration_action_set(migration, action)?;
        }

        Ok(())
    }

    fn apply_migration_action_set(
        &self,
        migration: &Migration,
        action: ActionType,
    ) -> anyhow::Result<()> {
        let planned = migration
            .actions()
            .get(&action)
            .ok_or_else(|| anyhow::anyhow!("Invalid action type"))?;

        for (name, oid) in planned {
            match (action, oid) {
                (ActionType::Delete, None) => self.remove_file(name)?,
                (ActionType::Add | ActionType::Modify, Some(oid)) => {
                    let data = migration.load_blob_data(oid)?;
                    self.write_file(name, &data)?;
                }
                _ => anyhow::bail!("Invalid action and entry combination"),
            }
        }

        Ok(())
    }
}
