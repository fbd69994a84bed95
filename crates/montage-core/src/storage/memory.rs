//! In-process backend.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::store::{ObjectStore, StoredObject};
use crate::error::StorageError;

/// Keeps every object in a map. URLs are `memory://<bucket>/<key>`.
#[derive(Default)]
pub struct MemoryStore {
    bucket: String,
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    /// A copy of the object stored under `key`.
    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.lock().get(key).cloned()
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StoredObject>> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, object: StoredObject) -> Result<String, StorageError> {
        let url = format!("memory://{}/{}", self.bucket, object.key);
        self.lock().insert(object.key.clone(), object);
        Ok(url)
    }
}
