//! Object storage capability used by the pipeline.
//!
//! The pipeline only needs two calls: read an object with its content type, and write one.
//! Retries, if any, belong to the backend client; implementations here make exactly one
//! attempt per call and never cache.

pub mod fs;
pub mod memory;

use crate::foundation::{core::ObjectRef, error::StorageError};

/// Raw object bytes plus the content type recorded at write time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Read/write access to bucket+key addressed objects.
///
/// Implementations must be shareable across concurrent invocations.
pub trait StorageGateway: Send + Sync {
    /// Read `obj`, failing with [`StorageError::Fetch`].
    fn fetch(&self, obj: &ObjectRef) -> Result<StoredObject, StorageError>;

    /// Write `bytes` to `obj`, failing with [`StorageError::Store`].
    fn store(&self, obj: &ObjectRef, bytes: Vec<u8>, content_type: &str)
    -> Result<(), StorageError>;
}

/// Best-effort content type for a key, based on its extension.
pub fn guess_content_type(key: &str) -> &'static str {
    key.rsplit_once('.')
        .and_then(|(_, ext)| image::ImageFormat::from_extension(ext))
        .map_or("application/octet-stream", |f| f.to_mime_type())
}

pub(crate) fn fetch_error(obj: &ObjectRef, source: anyhow::Error) -> StorageError {
    StorageError::Fetch {
        bucket: obj.bucket().to_string(),
        key: obj.key().to_string(),
        source,
    }
}

pub(crate) fn store_error(obj: &ObjectRef, source: anyhow::Error) -> StorageError {
    StorageError::Store {
        bucket: obj.bucket().to_string(),
        key: obj.key().to_string(),
        source,
    }
}
