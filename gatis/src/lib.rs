//! GATIS: client core for a text-to-image demo.
//!
//! A page collects a prompt, [`GenerationService`] sends it through
//! [`ApiClient`], and the result is prepended to the history kept by
//! [`HistoryStore`]. [`SessionGate`] decides whether the generation page is
//! reachable at all.
//!
//! Browser storage and HTTP are ports ([`KeyValueStore`], [`Transport`]);
//! the `browser` feature provides the localStorage and fetch adapters.
//!
//! # Quick Start
//!
//! ```no_run
//! use gatis::{ApiClient, ClientConfig, GenerationService, MemoryStore, Transport};
//!
//! async fn submit<T: Transport>(transport: T) -> gatis::Result<()> {
//!     let client = ApiClient::new(transport, ClientConfig::from_env());
//!     let service = GenerationService::new(client, MemoryStore::new());
//!
//!     let outcome = service.generate("A red bird with a black head", None).await?;
//!     println!("{}", outcome.result.result_location);
//!     assert_eq!(outcome.history[0].prompt_text, "A red bird with a black head");
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod history;
mod service;
mod session;
pub mod storage;
pub mod transport;

pub use client::{ApiClient, Credentials, GenerationRequest, GenerationResult};
pub use config::{normalize_base_url, AuthMode, ClientConfig, ResponseMode, DEFAULT_API_URL};
pub use error::{GatisError, Result};
pub use history::{Clock, HistoryEntry, HistoryStore, SystemClock, MAX_APPEND_ATTEMPTS};
pub use service::{GenerationOutcome, GenerationService};
pub use session::{AuthBackend, Page, RemoteVerifier, SessionGate, StubVerifier, Verifier};
pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use transport::{Transport, TransportError};

#[cfg(feature = "browser")]
pub use storage::LocalStore;
#[cfg(feature = "browser")]
pub use transport::GlooTransport;

#[cfg(test)]
mod test_helpers;
