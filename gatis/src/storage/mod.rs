//! Key/value storage port and its implementations.
//!
//! Everything the client persists (session flag, token, username, history,
//! config overrides) goes through [`KeyValueStore`], so pages never touch
//! `window.localStorage` directly and tests can swap in [`MemoryStore`].

mod memory;
#[cfg(feature = "browser")]
mod local;

pub use memory::MemoryStore;
#[cfg(feature = "browser")]
pub use local::LocalStore;

use thiserror::Error;

// Storage keys. The first four match what the original JS client wrote.
pub const STORAGE_AUTHENTICATED: &str = "isAuthenticated";
pub const STORAGE_TOKEN: &str = "token";
pub const STORAGE_USERNAME: &str = "username";
pub const STORAGE_HISTORY: &str = "imageHistory";
pub const STORAGE_API_URL: &str = "gatis.api_url";
pub const STORAGE_RESPONSE_MODE: &str = "gatis.response_mode";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    Write(String),

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Value under '{key}' kept changing; gave up after {attempts} attempts")]
    Contention { key: String, attempts: usize },
}

/// String-valued key/value storage scoped to one browser profile.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str);

    /// Write `new` only if the stored value still equals `expected`
    /// (`None` meaning absent). Returns whether the write happened.
    ///
    /// The default is a read-compare-write with no await in between. That is
    /// atomic against other tasks on the same thread only; another tab runs
    /// on its own thread and can still write between the read and the write.
    /// Callers re-read after a successful swap if they need more.
    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<bool, StorageError> {
        if self.get(key).as_deref() != expected {
            return Ok(false);
        }
        self.set(key, new)?;
        Ok(true)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<bool, StorageError> {
        (**self).compare_and_swap(key, expected, new)
    }
}
