//! HTTP client for a remote store server (see [`super::server`]).

use super::{GameStore, StoreError, SUBSCRIPTION_BUFFER};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// How often a subscription polls the remote record.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Store client speaking to `GET/PUT/DELETE {base}/games/{code}`.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStore {
    /// Creates a client for the given server base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, code: &str) -> String {
        format!("{}/games/{}", self.base_url, code)
    }
}

#[async_trait]
impl GameStore for HttpStore {
    async fn get(&self, code: &str) -> Result<Option<Value>, StoreError> {
        let response = self.client.get(self.url(code)).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StoreError::Rejected {
                status: response.status().as_u16(),
            });
        }
        Ok(Some(response.json().await?))
    }

    async fn put(&self, code: &str, record: Value) -> Result<(), StoreError> {
        let response = self.client.put(self.url(code)).json(&record).send().await?;
        if !response.status().is_success() {
            return Err(StoreError::Rejected {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn remove(&self, code: &str) -> Result<(), StoreError> {
        let response = self.client.delete(self.url(code)).send().await?;
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::Rejected {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    /// Polls the record at a fixed interval and forwards each changed
    /// snapshot. The task winds down when the receiver is dropped.
    async fn subscribe(&self, code: &str) -> Result<mpsc::Receiver<Value>, StoreError> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let store = self.clone();
        let code = code.to_string();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(POLL_INTERVAL);
            let mut last: Option<Value> = None;
            loop {
                interval.tick().await;
                match store.get(&code).await {
                    Ok(Some(snapshot)) => {
                        if last.as_ref() != Some(&snapshot) {
                            last = Some(snapshot.clone());
                            if tx.send(snapshot).await.is_err() {
                                debug!(code = %code, "subscriber gone, ending poll");
                                break;
                            }
                        }
                    }
                    Ok(None) => {
                        // Record purged remotely; nothing more to watch.
                        if last.is_some() {
                            debug!(code = %code, "record disappeared, ending poll");
                            break;
                        }
                    }
                    Err(e) => {
                        // Transient network trouble; keep polling.
                        warn!(code = %code, error = %e, "poll failed");
                    }
                }
                if tx.is_closed() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}
