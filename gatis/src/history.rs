//! Generation history persisted in the key/value store.
//!
//! The log is a JSON array under [`STORAGE_HISTORY`], newest first. It is
//! rewritten in full on every append; unreadable content counts as empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::storage::{KeyValueStore, StorageError, STORAGE_HISTORY};

/// How many times an append re-reads the log after losing a race.
pub const MAX_APPEND_ATTEMPTS: usize = 8;

/// One past generation. Never modified once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Creation time in milliseconds, unique within the log.
    pub id: i64,
    #[serde(rename = "inputText")]
    pub prompt_text: String,
    #[serde(rename = "imageUrl")]
    pub result_location: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct HistoryStore<S> {
    store: S,
    limit: usize,
}

impl<S: KeyValueStore> HistoryStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Keep at most `limit` entries, dropping the oldest; 0 disables the cap.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn load(&self) -> Vec<HistoryEntry> {
        parse_log(self.store.get(STORAGE_HISTORY).as_deref())
    }

    /// Prepend `entry` and persist the whole log. Returns the new log.
    pub fn append(&self, entry: HistoryEntry) -> Result<Vec<HistoryEntry>, StorageError> {
        self.commit(|_| entry.clone()).map(|(_, entries)| entries)
    }

    /// Create an entry stamped `at` with an id unused in the current log,
    /// and append it.
    pub fn record(
        &self,
        prompt_text: &str,
        result_location: &str,
        at: DateTime<Utc>,
    ) -> Result<(HistoryEntry, Vec<HistoryEntry>), StorageError> {
        self.commit(|current| HistoryEntry {
            id: next_id(current, at),
            prompt_text: prompt_text.to_string(),
            result_location: result_location.to_string(),
            created_at: at,
        })
    }

    // Read the freshest log, prepend, and write back only if nobody else
    // wrote in between; otherwise start over from the new log. A rejected
    // write (full quota) drops the oldest entries until the log fits.
    fn commit(
        &self,
        mut make_entry: impl FnMut(&[HistoryEntry]) -> HistoryEntry,
    ) -> Result<(HistoryEntry, Vec<HistoryEntry>), StorageError> {
        for attempt in 1..=MAX_APPEND_ATTEMPTS {
            let raw = self.store.get(STORAGE_HISTORY);
            let mut entries = parse_log(raw.as_deref());
            let entry = make_entry(&entries);

            entries.insert(0, entry.clone());
            if self.limit > 0 {
                entries.truncate(self.limit);
            }

            loop {
                let serialized = serde_json::to_string(&entries)?;
                match self
                    .store
                    .compare_and_swap(STORAGE_HISTORY, raw.as_deref(), &serialized)
                {
                    Ok(true) => {
                        debug!("History entry {} saved ({} total)", entry.id, entries.len());
                        return Ok((entry, entries));
                    }
                    Ok(false) => break,
                    Err(StorageError::Write(reason)) if entries.len() > 1 => {
                        let dropped = entries.pop().map(|e| e.id);
                        warn!(
                            "History write rejected ({}), evicting oldest entry {:?}",
                            reason, dropped
                        );
                    }
                    Err(e) => return Err(e),
                }
            }
            debug!("History changed during append (attempt {}), retrying", attempt);
        }

        Err(StorageError::Contention {
            key: STORAGE_HISTORY.to_string(),
            attempts: MAX_APPEND_ATTEMPTS,
        })
    }
}

fn parse_log(raw: Option<&str>) -> Vec<HistoryEntry> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Ignoring unreadable history: {}", e);
        Vec::new()
    })
}

pub(crate) fn next_id(current: &[HistoryEntry], at: DateTime<Utc>) -> i64 {
    let millis = at.timestamp_millis();
    match current.iter().map(|e| e.id).max() {
        Some(newest) if newest >= millis => newest.checked_add(1).unwrap_or(millis),
        _ => millis,
    }
}
