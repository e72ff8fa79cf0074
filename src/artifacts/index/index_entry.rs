//! Staging index entry
//!
//! An entry pairs a tracked filename with a blob id. The same layout is used
//! for both sections of the index: for additions the id names the staged
//! copy, for removals the blob the current commit tracks.

use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::anyhow;
use byteorder::{ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Write};

/// Size of the name length prefix in bytes
pub const NAME_LENGTH_SIZE: usize = 2;

/// Size of a binary object id in bytes
pub const OID_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// File path relative to the repository root, `/`-separated
    pub name: String,
    pub oid: ObjectId,
}

impl Packable for IndexEntry {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let name_length = u16::try_from(self.name.len())
            .map_err(|_| anyhow!("File name too long for the index: {}", self.name))?;

        let mut bytes = Vec::with_capacity(NAME_LENGTH_SIZE + self.name.len() + OID_SIZE);
        bytes.write_u16::<byteorder::NetworkEndian>(name_length)?;
        bytes.write_all(self.name.as_bytes())?;
        self.oid.write_h40_to(&mut bytes)?;

        Ok(Bytes::from(bytes))
    }
}

impl Unpackable for IndexEntry {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let name_length = reader.read_u16::<byteorder::NetworkEndian>()? as usize;

        let mut name = vec![0u8; name_length];
        reader.read_exact(&mut name)?;
        let name =
            String::from_utf8(name).map_err(|_| anyhow!("Invalid file name in index entry"))?;

        let oid = ObjectId::read_h40_from(&mut reader)?;

        Ok(IndexEntry { name, oid })
    }
}
