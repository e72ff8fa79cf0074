//! Stored object types and operations
//!
//! Everything written to the object database is one of two kinds:
//!
//! - **Blob**: File content (raw bytes)
//! - **Commit**: Snapshot with metadata (parents, timestamp, blob mapping, message)
//!
//! Both serialize to the framed form `<type> <size>\0<content>` and are
//! identified by the SHA-1 digest of that form.

pub mod blob;
pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;
