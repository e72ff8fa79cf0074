//! Commit object
//!
//! Commits are full snapshots of the tracked files at one point in time.
//! They contain:
//! - Parent commit ID(s) (none for the root commit, two for merges)
//! - A creation timestamp
//! - The blob mapping: every tracked filename and the blob holding its content
//! - The commit message
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0
//! parent <parent-sha>
//! date <unix-seconds> <timezone>
//! blob <blob-sha> <filename>
//!
//! <commit message>
//! ```

use crate::artifacts::objects::object::{Object, Packable, Unpackable, frame};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, SubsecRound, Utc};
use std::collections::BTreeMap;
use std::io::BufRead;

/// Message of the commit created by `init`
pub const ROOT_COMMIT_MESSAGE: &str = "initial commit";

/// Environment variable overriding the creation timestamp of new commits
pub const COMMIT_DATE_ENV: &str = "BITLET_COMMIT_DATE";

/// Filename → blob mapping of a commit, ordered by filename
pub type BlobMapping = BTreeMap<String, ObjectId>;

/// Slim representation of a commit
///
/// Contains only what the split point finder needs to walk the history.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SlimCommit {
    /// The commit's object ID
    pub oid: ObjectId,
    /// The commit's parent object IDs
    pub parents: Vec<ObjectId>,
}

/// Snapshot of the tracked files with metadata
///
/// The identifier is only known once the commit has been written to (or
/// read from) the object database.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Assigned at write time
    oid: Option<ObjectId>,
    /// Parent commit IDs (empty for the root commit, two for merge commits)
    parents: Vec<ObjectId>,
    /// Creation time with the committer's offset
    timestamp: DateTime<FixedOffset>,
    /// Complete snapshot of tracked files
    blobs: BlobMapping,
    /// Commit message
    message: String,
}

impl Commit {
    /// Create a new, not yet written commit
    ///
    /// # Arguments
    ///
    /// * `parents` - Parent commit IDs (at most two)
    /// * `blobs` - The full filename → blob mapping of the snapshot
    /// * `message` - Commit message
    /// * `timestamp` - Creation time
    pub fn new(
        parents: Vec<ObjectId>,
        blobs: BlobMapping,
        message: String,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Commit {
            oid: None,
            parents,
            timestamp,
            blobs,
            message,
        }
    }

    /// The commit every repository starts from: no parents, no files and the epoch as timestamp
    pub fn root() -> Self {
        Self::new(
            vec![],
            BlobMapping::new(),
            ROOT_COMMIT_MESSAGE.to_string(),
            DateTime::<Utc>::UNIX_EPOCH.fixed_offset(),
        )
    }

    /// Timestamp for a new commit
    ///
    /// Reads `BITLET_COMMIT_DATE` if set, otherwise uses the current local time.
    pub fn timestamp_from_env() -> anyhow::Result<DateTime<FixedOffset>> {
        Self::parse_timestamp(std::env::var(COMMIT_DATE_ENV).ok())
    }

    /// Stored timestamps have whole-second precision
    fn parse_timestamp(date: Option<String>) -> anyhow::Result<DateTime<FixedOffset>> {
        let timestamp = match date {
            Some(date_str) => DateTime::parse_from_rfc2822(&date_str)
                .or_else(|_| DateTime::parse_from_str(&date_str, "%Y-%m-%d %H:%M:%S %z"))
                .with_context(|| format!("invalid {COMMIT_DATE_ENV}: {date_str}"))?,
            None => chrono::Local::now().fixed_offset(),
        };

        Ok(timestamp.trunc_subsecs(0))
    }

    pub fn oid(&self) -> Option<&ObjectId> {
        self.oid.as_ref()
    }

    pub(crate) fn set_oid(&mut self, oid: ObjectId) {
        self.oid = Some(oid);
    }

    pub fn with_oid(mut self, oid: ObjectId) -> Self {
        self.oid = Some(oid);
        self
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    /// First parent, followed by `log`
    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn second_parent(&self) -> Option<&ObjectId> {
        self.parents.get(1)
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// First line of the message
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// Timestamp like "Thu Jan 01 00:00:00 1970 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.timestamp.format("%a %b %d %H:%M:%S %Y %z").to_string()
    }

    pub fn blobs(&self) -> &BlobMapping {
        &self.blobs
    }

    pub fn blob(&self, file_name: &str) -> Option<&ObjectId> {
        self.blobs.get(file_name)
    }

    pub fn tracks(&self, file_name: &str) -> bool {
        self.blobs.contains_key(file_name)
    }

    pub fn to_slim(&self) -> anyhow::Result<SlimCommit> {
        let oid = self
            .oid
            .clone()
            .context("commit has not been written yet")?;

        Ok(SlimCommit {
            oid,
            parents: self.parents.clone(),
        })
    }

    fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![];

        for parent in &self.parents {
            lines.push(format!("parent {}", parent.as_ref()));
        }
        lines.push(format!(
            "date {} {}",
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        ));
        for (file_name, blob_oid) in &self.blobs {
            lines.push(format!("blob {} {}", blob_oid.as_ref(), file_name));
        }

        lines
    }

    fn parse_date(value: &str) -> anyhow::Result<DateTime<FixedOffset>> {
        let (seconds, timezone) = value
            .split_once(' ')
            .context("Invalid commit object: malformed date line")?;
        let seconds = seconds
            .parse::<i64>()
            .context("Invalid commit object: invalid timestamp")?;
        let offset = Self::parse_offset(timezone)?;

        let datetime = DateTime::from_timestamp(seconds, 0)
            .context("Invalid commit object: timestamp out of range")?;
        Ok(datetime.with_timezone(&offset))
    }

    // "+hhmm" / "-hhmm"
    fn parse_offset(value: &str) -> anyhow::Result<FixedOffset> {
        let invalid = || anyhow::anyhow!("Invalid commit object: invalid timezone {value}");

        if value.len() != 5 || !value.is_ascii() {
            return Err(invalid());
        }
        let sign = match &value[..1] {
            "+" => 1,
            "-" => -1,
            _ => return Err(invalid()),
        };
        let hours = value[1..3].parse::<i32>().map_err(|_| invalid())?;
        let minutes = value[3..5].parse::<i32>().map_err(|_| invalid())?;

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut object_content = self.header_lines();
        object_content.push(String::new());
        object_content.push(self.message.to_string());

        let object_content = object_content.join("\n");
        Ok(frame(self.object_type(), object_content.as_bytes()))
    }
}

impl Unpackable for Commit {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;
        let content = String::from_utf8(content)?;

        // header lines are never empty, so the first blank line ends them
        let (header, message) = content
            .split_once("\n\n")
            .context("Invalid commit object: missing message separator")?;

        let mut parents = Vec::new();
        let mut timestamp = None;
        let mut blobs = BlobMapping::new();

        for line in header.lines() {
            if let Some(parent_oid) = line.strip_prefix("parent ") {
                parents.push(ObjectId::try_parse(parent_oid.to_string())?);
            } else if let Some(date) = line.strip_prefix("date ") {
                timestamp = Some(Self::parse_date(date)?);
            } else if let Some(entry) = line.strip_prefix("blob ") {
                let (blob_oid, file_name) = entry
                    .split_once(' ')
                    .context("Invalid commit object: malformed blob line")?;
                blobs.insert(
                    file_name.to_string(),
                    ObjectId::try_parse(blob_oid.to_string())?,
                );
            } else {
                anyhow::bail!("Invalid commit object: unexpected line {line:?}");
            }
        }

        let timestamp = timestamp.context("Invalid commit object: missing date line")?;
        Ok(Self::new(parents, blobs, message.to_string(), timestamp))
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        let mut lines = self.header_lines();
        lines.push(String::new());
        lines.push(self.message.to_string());

        lines.join("\n")
    }
}
