use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    foundation::core::ObjectRef,
    foundation::error::StorageError,
    storage::{StorageGateway, StoredObject, fetch_error, guess_content_type, store_error},
};

const META_DIR: &str = ".meta";
const CONTENT_TYPE_SUFFIX: &str = ".content-type";

/// Local-directory object store: `<root>/<bucket>/<key>`.
///
/// Content types are kept in sidecar files under `<root>/.meta/<bucket>/<key>.content-type`;
/// objects written by other tools fall back to [`guess_content_type`].
#[derive(Clone, Debug)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of `obj`, rejecting keys that escape the bucket directory.
    pub fn object_path(&self, obj: &ObjectRef) -> anyhow::Result<PathBuf> {
        let bucket = normalize_bucket(obj.bucket())?;
        let key = normalize_key(obj.key())?;
        Ok(self.root.join(bucket).join(Path::new(&key)))
    }

    fn content_type_path(&self, obj: &ObjectRef) -> anyhow::Result<PathBuf> {
        let bucket = normalize_bucket(obj.bucket())?;
        let key = normalize_key(obj.key())?;
        Ok(self
            .root
            .join(META_DIR)
            .join(bucket)
            .join(Path::new(&format!("{key}{CONTENT_TYPE_SUFFIX}"))))
    }

    fn read(&self, obj: &ObjectRef) -> anyhow::Result<StoredObject> {
        let path = self.object_path(obj)?;
        let bytes = std::fs::read(&path)
            .with_context(|| format!("read object bytes from '{}'", path.display()))?;

        let meta = self.content_type_path(obj)?;
        let content_type = match std::fs::read_to_string(&meta) {
            Ok(s) => s.trim().to_string(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                guess_content_type(obj.key()).to_string()
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read content type from '{}'", meta.display())));
            }
        };
        Ok(StoredObject {
            bytes,
            content_type,
        })
    }

    fn write(&self, obj: &ObjectRef, bytes: &[u8], content_type: &str) -> anyhow::Result<()> {
        let path = self.object_path(obj)?;
        let meta = self.content_type_path(obj)?;
        for p in [&path, &meta] {
            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create dir '{}'", parent.display()))?;
            }
        }
        // Sidecar first: an object on disk always has its content type.
        std::fs::write(&meta, content_type)
            .with_context(|| format!("write content type to '{}'", meta.display()))?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("write object bytes to '{}'", path.display()))?;
        Ok(())
    }
}

impl StorageGateway for FsStorage {
    fn fetch(&self, obj: &ObjectRef) -> Result<StoredObject, StorageError> {
        self.read(obj).map_err(|e| fetch_error(obj, e))
    }

    fn store(
        &self,
        obj: &ObjectRef,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.write(obj, &bytes, content_type)
            .map_err(|e| store_error(obj, e))
    }
}

fn normalize_bucket(bucket: &str) -> anyhow::Result<&str> {
    if bucket.is_empty() || bucket.starts_with('.') || bucket.contains(['/', '\\']) {
        anyhow::bail!("invalid bucket name '{bucket}'");
    }
    Ok(bucket)
}

/// Map an object key onto a relative path below its bucket directory.
///
/// Keys are kept byte-for-byte; the store refuses keys it cannot place on disk without
/// merging them with another key: leading `/`, empty segments (`a//b`), `.`/`..` segments,
/// and backslashes.
pub fn normalize_key(key: &str) -> anyhow::Result<String> {
    if key.contains('\\') {
        anyhow::bail!("key '{key}' contains a backslash");
    }
    for (idx, segment) in key.split('/').enumerate() {
        match segment {
            "" if idx == 0 => anyhow::bail!("key '{key}' starts with '/'"),
            "" => anyhow::bail!("key '{key}' has an empty path segment"),
            "." | ".." => anyhow::bail!("key '{key}' has a '{segment}' path segment"),
            _ => {}
        }
    }
    Ok(key.to_string())
}

#[cfg(test)]
#[path = "../../tests/unit/storage/fs.rs"]
mod tests;
