use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::{
    foundation::core::ObjectRef,
    foundation::error::StorageError,
    storage::{StorageGateway, StoredObject, fetch_error},
};

/// In-process object store that counts every call it receives.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<ObjectRef, StoredObject>>,
    fetches: AtomicUsize,
    stores: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without counting it as a store.
    pub fn insert(&self, obj: ObjectRef, bytes: Vec<u8>, content_type: impl Into<String>) {
        let stored = StoredObject {
            bytes,
            content_type: content_type.into(),
        };
        self.lock().insert(obj, stored);
    }

    /// Snapshot of an object without counting it as a fetch.
    pub fn get(&self, obj: &ObjectRef) -> Option<StoredObject> {
        self.lock().get(obj).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ObjectRef, StoredObject>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StorageGateway for MemoryStorage {
    fn fetch(&self, obj: &ObjectRef) -> Result<StoredObject, StorageError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.get(obj)
            .ok_or_else(|| fetch_error(obj, anyhow::anyhow!("no such object")))
    }

    fn store(
        &self,
        obj: &ObjectRef,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        self.insert(obj.clone(), bytes, content_type);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/storage/memory.rs"]
mod tests;
