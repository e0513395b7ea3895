//! The generation page's flow: submit a prompt, then record the result.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::client::{ApiClient, GenerationResult};
use crate::error::Result;
use crate::history::{next_id, Clock, HistoryEntry, HistoryStore, SystemClock};
use crate::storage::KeyValueStore;
use crate::transport::Transport;

/// What a successful submission produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub result: GenerationResult,
    pub entry: HistoryEntry,
    /// The log the page should show from now on, newest first.
    pub history: Vec<HistoryEntry>,
    /// False when the entry could not be written to storage and only lives
    /// in `history`.
    pub persisted: bool,
}

#[derive(Debug, Clone)]
pub struct GenerationService<T, S, C = SystemClock> {
    client: ApiClient<T>,
    history: HistoryStore<S>,
    clock: C,
    /// Entries storage refused, newest first, kept until a write succeeds.
    unsaved: Arc<Mutex<Vec<HistoryEntry>>>,
}

impl<T: Transport, S: KeyValueStore> GenerationService<T, S, SystemClock> {
    /// Service over `store`, capping history at the client's configured limit.
    pub fn new(client: ApiClient<T>, store: S) -> Self {
        Self::with_clock(client, store, SystemClock)
    }
}

impl<T: Transport, S: KeyValueStore, C: Clock> GenerationService<T, S, C> {
    pub fn with_clock(client: ApiClient<T>, store: S, clock: C) -> Self {
        let history = HistoryStore::new(store).with_limit(client.config().history_limit);
        Self {
            client,
            history,
            clock,
            unsaved: Arc::default(),
        }
    }

    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    /// History to show when the page mounts.
    pub fn load_history(&self) -> Vec<HistoryEntry> {
        self.history.load()
    }

    /// Generate an image for `prompt` and add it to the history.
    ///
    /// A failed request leaves the history untouched.
    pub async fn generate(&self, prompt: &str, token: Option<&str>) -> Result<GenerationOutcome> {
        let result = self.client.request_generation(prompt, token).await?;
        let at = self.clock.now();

        match self.history.record(prompt, &result.result_location, at) {
            Ok((entry, history)) => {
                info!("Generated image for prompt ({} in history)", history.len());
                self.unsaved_entries().clear();
                Ok(GenerationOutcome {
                    result,
                    entry,
                    history,
                    persisted: true,
                })
            }
            Err(e) => {
                warn!("Generated image but could not save history: {}", e);
                let mut unsaved = self.unsaved_entries();
                let stored = self.history.load();
                let known: Vec<HistoryEntry> = unsaved.iter().chain(&stored).cloned().collect();
                let entry = HistoryEntry {
                    id: next_id(&known, at),
                    prompt_text: prompt.to_string(),
                    result_location: result.result_location.clone(),
                    created_at: at,
                };
                unsaved.insert(0, entry.clone());

                let limit = self.client.config().history_limit;
                if limit > 0 {
                    unsaved.truncate(limit);
                }
                let mut history: Vec<HistoryEntry> =
                    unsaved.iter().chain(&stored).cloned().collect();
                if limit > 0 {
                    history.truncate(limit);
                }
                Ok(GenerationOutcome {
                    result,
                    entry,
                    history,
                    persisted: false,
                })
            }
        }
    }

    fn unsaved_entries(&self) -> MutexGuard<'_, Vec<HistoryEntry>> {
        self.unsaved.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
