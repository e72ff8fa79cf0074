use crate::artifacts::database::ObjectStore;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::BitletError;
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Object namespace backed by a directory of zlib-compressed files
#[derive(Debug)]
pub struct FsObjectStore {
    kind: ObjectType,
    path: Box<Path>,
}

impl FsObjectStore {
    pub fn new(kind: ObjectType, path: Box<Path>) -> Self {
        FsObjectStore { kind, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn object_path(&self, object_id: &ObjectId) -> PathBuf {
        self.path.join(object_id.to_path())
    }

    fn write_object(&self, object_path: PathBuf, object_content: Bytes) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .context(format!("Invalid object path {}", object_path.display()))?;
        std::fs::create_dir_all(object_dir).context(format!(
            "Unable to create object directory {}",
            object_dir.display()
        ))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content = Self::compress(object_content)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)
            .context(format!(
                "Unable to open object file {}",
                temp_object_path.display()
            ))?;

        file.write_all(&object_content).context(format!(
            "Unable to write object file {}",
            temp_object_path.display()
        ))?;
        file.sync_all()?;

        // readers never observe a partially written object
        std::fs::rename(&temp_object_path, &object_path).context(format!(
            "Unable to rename object file to {}",
            object_path.display()
        ))?;

        Ok(())
    }

    fn compress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(&data)
            .context("Unable to compress object content")?;

        encoder
            .finish()
            .map(|compressed_content| compressed_content.into())
            .context("Unable to finish compressing object content")
    }

    fn decompress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(&*data);
        let mut decompressed_content = Vec::new();
        decoder
            .read_to_end(&mut decompressed_content)
            .context("Unable to decompress object content")?;

        Ok(decompressed_content.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }

    fn fan_out_dirs(&self) -> anyhow::Result<Vec<(String, PathBuf)>> {
        if !self.path.is_dir() {
            return Ok(vec![]);
        }

        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(&self.path)? {
            let entry = entry?;
            let dir_name = entry.file_name().to_string_lossy().to_string();

            if dir_name.len() == 2 && entry.path().is_dir() {
                dirs.push((dir_name, entry.path()));
            }
        }

        Ok(dirs)
    }

    fn collect_dir(
        dir_name: &str,
        dir_path: &Path,
        file_prefix: &str,
        matches: &mut Vec<ObjectId>,
    ) -> anyhow::Result<()> {
        for entry in std::fs::read_dir(dir_path)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();

            // leftovers of interrupted writes are not objects
            if file_name.starts_with("tmp-obj-") || !file_name.starts_with(file_prefix) {
                continue;
            }
            if let Ok(object_id) = ObjectId::try_parse(format!("{dir_name}{file_name}")) {
                matches.push(object_id);
            }
        }

        Ok(())
    }
}

impl ObjectStore for FsObjectStore {
    fn kind(&self) -> ObjectType {
        self.kind
    }

    fn put(&self, content: Bytes) -> anyhow::Result<ObjectId> {
        let object_id = ObjectId::digest(&content);
        let object_path = self.object_path(&object_id);

        if !object_path.exists() {
            self.write_object(object_path, content)?;
        }

        Ok(object_id)
    }

    fn get(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        let object_path = self.object_path(object_id);
        if !object_path.exists() {
            return Err(BitletError::ObjectNotFound(self.kind, object_id.to_string()).into());
        }

        let object_content = std::fs::read(&object_path).context(format!(
            "Unable to read object file {}",
            object_path.display()
        ))?;

        Self::decompress(object_content.into())
    }

    fn contains(&self, object_id: &ObjectId) -> bool {
        self.object_path(object_id).exists()
    }

    fn list(&self) -> anyhow::Result<Vec<ObjectId>> {
        let mut object_ids = Vec::new();
        for (dir_name, dir_path) in self.fan_out_dirs()? {
            Self::collect_dir(&dir_name, &dir_path, "", &mut object_ids)?;
        }

        object_ids.sort();
        Ok(object_ids)
    }

    /// For prefixes of 2+ characters only the matching fan-out directory is read.
    fn find_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        if !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(vec![]);
        }
        if prefix.len() < 2 {
            return Ok(self
                .list()?
                .into_iter()
                .filter(|object_id| object_id.starts_with(&prefix))
                .collect());
        }

        let (dir_name, file_prefix) = prefix.split_at(2);
        let dir_path = self.path.join(dir_name);
        let mut matches = Vec::new();
        if dir_path.is_dir() {
            Self::collect_dir(dir_name, &dir_path, file_prefix, &mut matches)?;
        }

        matches.sort();
        Ok(matches)
    }
}
