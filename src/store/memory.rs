//! In-process store backing the server binary and the test suite.

use super::{GameStore, StoreError, SUBSCRIPTION_BUFFER};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::debug;

/// Shared in-memory record store. Cloning yields another handle to the
/// same records and subscriber lists.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, Value>>>,
    subscribers: Arc<Mutex<HashMap<String, Vec<mpsc::Sender<Value>>>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Senders subscribed to `code`, pruned of closed channels.
    fn take_senders(&self, code: &str) -> Vec<mpsc::Sender<Value>> {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        match subscribers.get_mut(code) {
            Some(senders) => {
                senders.retain(|s| !s.is_closed());
                senders.clone()
            }
            None => Vec::new(),
        }
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn get(&self, code: &str) -> Result<Option<Value>, StoreError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(code).cloned())
    }

    async fn put(&self, code: &str, record: Value) -> Result<(), StoreError> {
        {
            let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
            records.insert(code.to_string(), record.clone());
        }
        // Fan out outside the lock.
        for sender in self.take_senders(code) {
            let _ = sender.send(record.clone()).await;
        }
        debug!(code, "record written");
        Ok(())
    }

    async fn remove(&self, code: &str) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.remove(code);
        debug!(code, "record removed");
        Ok(())
    }

    async fn subscribe(&self, code: &str) -> Result<mpsc::Receiver<Value>, StoreError> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.entry(code.to_string()).or_default().push(tx);
        Ok(rx)
    }
}
