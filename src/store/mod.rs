//! Shared game store: a key-value space of JSON records with
//! last-writer-wins semantics and change notification.
//!
//! The store is deliberately schema-less — it transports raw
//! [`serde_json::Value`]s and enforces no game rules. Readers normalize
//! every snapshot they receive; see [`crate::session`].

mod http;
mod memory;
pub mod server;

pub use http::HttpStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use derive_more::{Display, Error, From};
use serde_json::Value;
use tokio::sync::mpsc;

/// Store access failure.
#[derive(Debug, Display, Error, From)]
pub enum StoreError {
    /// Transport-level failure talking to a remote store.
    #[display("store request failed: {_0}")]
    Http(reqwest::Error),
    /// The remote store answered with an unexpected status.
    #[display("store rejected the request with status {status}")]
    #[from(ignore)]
    Rejected {
        /// HTTP status code returned.
        status: u16,
    },
    /// A record could not be encoded or decoded.
    #[display("store payload was not valid JSON: {_0}")]
    Payload(serde_json::Error),
}

/// Channel capacity for record-change subscriptions.
const SUBSCRIPTION_BUFFER: usize = 16;

/// Handle to a shared record store keyed by session code.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Fetches the record under `code`, if present.
    async fn get(&self, code: &str) -> Result<Option<Value>, StoreError>;

    /// Writes the whole record under `code`, replacing any previous value.
    async fn put(&self, code: &str, record: Value) -> Result<(), StoreError>;

    /// Deletes the record under `code`. Deleting a missing record is not an
    /// error.
    async fn remove(&self, code: &str) -> Result<(), StoreError>;

    /// Subscribes to snapshots of the record under `code`. Each received
    /// value is the whole record as last written. Delivery is best-effort;
    /// the subscriber must tolerate missed intermediate states.
    async fn subscribe(&self, code: &str) -> Result<mpsc::Receiver<Value>, StoreError>;
}
