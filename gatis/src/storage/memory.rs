use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{KeyValueStore, StorageError};

/// In-memory store. Clones share the same map, which makes two clones behave
/// like two tabs of the same browser profile.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a consistent map of strings.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.map().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.map().remove(key);
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<bool, StorageError> {
        let mut map = self.map();
        if map.get(key).map(String::as_str) != expected {
            return Ok(false);
        }
        map.insert(key.to_string(), new.to_string());
        Ok(true)
    }
}
