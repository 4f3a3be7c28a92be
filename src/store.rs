// Copyright 2025 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Read-through, content-addressed cache over the remote blob source.
//!
//! A blob is fetched at most once per process lifetime: the first request for a key
//! streams the body (bounded by the configured size ceiling), parses it as JSON and
//! caches the parsed value; every later request is served from memory until an explicit
//! invalidation. Concurrent first requests for the same key are deduplicated behind a
//! per-key gate so only one network fetch is ever outstanding per key.
//!
//! Transient failures (connect errors, timeouts, 5xx) are retried a bounded number of
//! times with a fixed backoff. Oversized and malformed blobs are rejected without
//! retrying; another attempt would fetch the same content.

use crate::config::ClaimsConfig;
use crate::types::{AddressIndex, BatchData, MerkleManifest};
use bytes::BytesMut;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Blob {key} not found at the source")]
    NotFound { key: String },
    #[error("Invalid blob key: {key}")]
    InvalidKey { key: String },
    #[error("Failed to fetch blob {key} after {attempts} attempts: {reason}")]
    FetchFailed {
        key: String,
        attempts: u8,
        reason: String,
    },
    #[error("Blob {key} exceeds the size ceiling of {limit} bytes")]
    Oversized { key: String, limit: usize },
    #[error("Blob {key} is malformed: {source}")]
    Malformed {
        key: String,
        source: serde_json::Error,
    },
}

/// Outcome of a single fetch attempt, before retry classification.
enum FetchAttemptError {
    /// Network-level failure; worth another attempt.
    Transport(reqwest::Error),
    /// Non-success status other than 404; worth another attempt (gateways flap).
    Status(reqwest::StatusCode),
    /// The attempt exceeded the per-fetch timeout.
    TimedOut(Duration),
    /// The source does not have this blob. Retrying will not make it appear.
    Missing,
    /// The body crossed the size ceiling. Retrying would fetch the same bytes.
    TooLarge,
}

impl FetchAttemptError {
    fn reason(&self) -> String {
        match self {
            FetchAttemptError::Transport(err) => format!("transport error: {err}"),
            FetchAttemptError::Status(status) => format!("unexpected status: {status}"),
            FetchAttemptError::TimedOut(timeout) => {
                format!("timed out after {} seconds", timeout.as_secs())
            }
            FetchAttemptError::Missing => "not found".to_string(),
            FetchAttemptError::TooLarge => "size ceiling exceeded".to_string(),
        }
    }
}

/// The blob store: HTTP source plus the process-wide cache map.
///
/// The cache is shared, mutable, process-wide state mutated only through `get` and
/// `invalidate`; entries are immutable for their lifetime.
pub struct BlobStore {
    client: reqwest::Client,
    config: ClaimsConfig,
    cache: RwLock<HashMap<String, Arc<Value>>>,
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl BlobStore {
    pub fn new(config: ClaimsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            cache: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ClaimsConfig {
        &self.config
    }

    /// Fetch-or-return the parsed blob for `key`.
    pub async fn get(&self, key: &str) -> Result<Arc<Value>, StoreError> {
        if let Some(value) = self.cache.read().await.get(key) {
            debug!("Serving blob {key} from cache");
            return Ok(value.clone());
        }

        // Per-key gate: the first caller fetches, followers wait and then hit the cache.
        let gate = {
            let mut inflight = self.inflight.lock().await;
            inflight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = gate.lock().await;

        if let Some(value) = self.cache.read().await.get(key) {
            debug!("Blob {key} was fetched by a concurrent request");
            return Ok(value.clone());
        }

        let result = self.fetch_and_parse(key).await;

        {
            let mut inflight = self.inflight.lock().await;
            let _ = inflight.remove(key);
        }

        let value = Arc::new(result?);
        self.cache
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(value)
    }

    /// Evict a specific key, or the entire cache when `key` is `None`.
    ///
    /// Returns the number of evicted entries: 0 or 1 for a keyed invalidation, the
    /// prior cache size for a full clear.
    pub async fn invalidate(&self, key: Option<&str>) -> usize {
        let mut cache = self.cache.write().await;
        match key {
            Some(key) => {
                let existed = cache.remove(key).is_some();
                info!("Invalidated cache entry {key} (existed: {existed})");
                usize::from(existed)
            }
            None => {
                let size = cache.len();
                cache.clear();
                info!("Cleared the entire blob cache ({size} entries)");
                size
            }
        }
    }

    /// Number of cached entries.
    pub async fn cached_entries(&self) -> usize {
        self.cache.read().await.len()
    }

    /// The global address index blob.
    pub async fn address_index(&self) -> Result<AddressIndex, StoreError> {
        let key = self.config.address_index_key.clone();
        self.get_as(&key).await
    }

    /// The blob holding batch `batch_index`.
    pub async fn batch(&self, batch_index: u64) -> Result<BatchData, StoreError> {
        let key = self.config.batch_key(batch_index);
        self.get_as(&key).await
    }

    /// The top-level manifest blob.
    pub async fn manifest(&self) -> Result<MerkleManifest, StoreError> {
        let key = self.config.manifest_key.clone();
        self.get_as(&key).await
    }

    async fn get_as<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<T, StoreError> {
        let value = self.get(key).await?;
        T::deserialize(value.as_ref()).map_err(|source| StoreError::Malformed {
            key: key.to_string(),
            source,
        })
    }

    async fn fetch_and_parse(&self, key: &str) -> Result<Value, StoreError> {
        let url = self
            .config
            .base_url
            .join(key)
            .map_err(|_| StoreError::InvalidKey {
                key: key.to_string(),
            })?;

        let max_retries = self.config.max_retries;
        let mut retries = 0;

        let bytes = loop {
            let attempt = match tokio::time::timeout(
                self.config.fetch_timeout,
                self.fetch_once(url.clone()),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(FetchAttemptError::TimedOut(self.config.fetch_timeout)),
            };

            match attempt {
                Ok(bytes) => break bytes,
                Err(FetchAttemptError::Missing) => {
                    debug!("Blob {key} not found at {url}");
                    return Err(StoreError::NotFound {
                        key: key.to_string(),
                    });
                }
                Err(FetchAttemptError::TooLarge) => {
                    error!(
                        "Blob {key} exceeds the size ceiling of {} bytes",
                        self.config.max_blob_size
                    );
                    return Err(StoreError::Oversized {
                        key: key.to_string(),
                        limit: self.config.max_blob_size,
                    });
                }
                Err(err) => {
                    if retries == max_retries {
                        error!(
                            "Fetching blob {key} failed after {} attempts: {}",
                            retries + 1,
                            err.reason()
                        );
                        return Err(StoreError::FetchFailed {
                            key: key.to_string(),
                            attempts: retries + 1,
                            reason: err.reason(),
                        });
                    }

                    retries += 1;
                    warn!(
                        "Error fetching blob {key}: {}. Retry #{retries} in {:?}.",
                        err.reason(),
                        self.config.retry_interval
                    );
                    tokio::time::sleep(self.config.retry_interval).await;
                }
            }
        };

        info!("Fetched blob {key} ({} bytes)", bytes.len());
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Malformed {
            key: key.to_string(),
            source,
        })
    }

    /// One fetch attempt: stream the body, enforcing the size ceiling as chunks arrive
    /// so an oversized blob never fully lands in memory.
    async fn fetch_once(&self, url: url::Url) -> Result<BytesMut, FetchAttemptError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchAttemptError::Transport)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchAttemptError::Missing);
        }
        if !status.is_success() {
            return Err(FetchAttemptError::Status(status));
        }

        let limit = self.config.max_blob_size;
        if let Some(length) = response.content_length() {
            if length as usize > limit {
                return Err(FetchAttemptError::TooLarge);
            }
        }

        let mut buf = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(FetchAttemptError::Transport)?
        {
            if buf.len() + chunk.len() > limit {
                return Err(FetchAttemptError::TooLarge);
            }
            buf.extend_from_slice(&chunk);
        }

        Ok(buf)
    }
}
