//! Staging index file format
//!
//! The staging index records the changes queued for the next commit: files
//! staged for addition and files staged for removal.
//!
//! ## File Format
//!
//! ```text
//! Header (16 bytes):
//!   - Signature: "STAG" (4 bytes)
//!   - Version: 1 (4 bytes)
//!   - Addition count (4 bytes)
//!   - Removal count (4 bytes)
//!
//! Entries (variable length, additions first):
//!   - Name length (2 bytes)
//!   - Name (UTF-8)
//!   - Object ID (20 bytes)
//!
//! Checksum (20 bytes):
//!   - SHA-1 hash of all preceding bytes
//! ```
//!
//! All integers are big-endian.

pub mod checksum;
pub mod index_entry;
pub mod index_header;

/// Size of SHA-1 checksum in bytes
pub const CHECKSUM_SIZE: usize = 20;

/// Size of index header in bytes
pub const HEADER_SIZE: usize = 16;

/// Magic signature identifying staging index files
pub const SIGNATURE: &str = "STAG";

/// Staging index file format version
pub const VERSION: u32 = 1;
