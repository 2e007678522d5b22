//! Stowage Storage Library
//!
//! Object-store gateway for Stowage: presigned upload/download capabilities,
//! direct deletes, and the bounded reads the thumbnail deriver needs. The
//! service never streams file content itself; clients talk to the object
//! store directly with the URLs minted here.
//!
//! # Object key format
//!
//! Keys derive from a file's `code`, never from its display name:
//!
//! - **Attachments**: `attachments/{code}`
//! - **Images**: `images/{code}`, thumbnail sibling `images/{code}/thumbnail`
//!
//! Key derivation is centralized in the `keys` module so records can never
//! collide in storage even when display names match.

pub mod keys;
#[cfg(feature = "storage-memory")]
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-memory")]
pub use memory::MemoryObjectStore;
#[cfg(feature = "storage-s3")]
pub use s3::S3ObjectStore;
pub use traits::{ObjectGateway, PresignedUrl, StorageError, StorageResult};
