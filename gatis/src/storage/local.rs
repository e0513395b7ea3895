use gloo_storage::{LocalStorage, Storage};

use super::{KeyValueStore, StorageError};

/// `window.localStorage`, holding raw strings (not JSON-quoted) so values
/// written by earlier versions of the client read back unchanged.
///
/// Uses the default `compare_and_swap`, so two tabs appending at the same
/// instant can still overwrite each other; within one tab it is atomic.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|e| StorageError::Write(format!("{:?}", e)))
    }

    fn remove(&self, key: &str) {
        let _ = LocalStorage::raw().remove_item(key);
    }
}
