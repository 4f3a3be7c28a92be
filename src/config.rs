// Copyright 2025 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use std::env;
use std::time::Duration;
use url::Url;

/// Maximum size of a single fetched blob. Larger responses are rejected outright.
const MAX_BLOB_SIZE: usize = 500 * 1024 * 1024;

/// Attempts per blob fetch beyond the first.
const MAX_RETRIES: u8 = 3;

/// Fixed delay between retry attempts.
const RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// Timeout for a single fetch attempt.
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Well-known key of the global address index blob.
const ADDRESS_INDEX_KEY: &str = "address_map.json";

/// Well-known key of the top-level manifest blob.
const MANIFEST_KEY: &str = "merkle_data.json";

/// Environment variable providing the blob source base URL.
pub const BLOB_BASE_URL_ENV: &str = "CLAIM_BLOB_BASE_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid blob base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),
}

/// Configuration for the blob source and proof service.
///
/// Batch content is assumed immutable at its source, so there is no cache expiry knob;
/// entries live until explicit invalidation or process restart.
#[derive(Clone, Debug)]
pub struct ClaimsConfig {
    /// Base URL the blob keys are resolved against.
    pub base_url: Url,
    /// Upper bound on a single blob's size. Oversized blobs are rejected, not retried.
    pub max_blob_size: usize,
    /// Retry attempts after the first failed fetch. Only transient failures are retried.
    pub max_retries: u8,
    /// Fixed delay between retries.
    pub retry_interval: Duration,
    /// Timeout applied to each individual fetch attempt. There is no additional timeout
    /// on top of this; retries times the per-fetch timeout bounds total latency.
    pub fetch_timeout: Duration,
    /// Key of the global address index blob.
    pub address_index_key: String,
    /// Key of the top-level manifest blob.
    pub manifest_key: String,
}

impl ClaimsConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            max_blob_size: MAX_BLOB_SIZE,
            max_retries: MAX_RETRIES,
            retry_interval: RETRY_INTERVAL,
            fetch_timeout: FETCH_TIMEOUT,
            address_index_key: ADDRESS_INDEX_KEY.to_string(),
            manifest_key: MANIFEST_KEY.to_string(),
        }
    }

    /// Read the configuration from environment variables.
    ///
    /// Only the base URL is required; everything else keeps its default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var(BLOB_BASE_URL_ENV)
            .map_err(|_| ConfigError::MissingEnvVar(BLOB_BASE_URL_ENV))?;
        let base_url = base_url
            .parse::<Url>()
            .map_err(|_| ConfigError::InvalidBaseUrl(base_url))?;
        info!("Using blob source at {base_url} from {BLOB_BASE_URL_ENV}");
        Ok(Self::new(base_url))
    }

    /// Key of the blob holding batch `batch_index`.
    pub fn batch_key(&self, batch_index: u64) -> String {
        format!("batches/batch_{batch_index}.json")
    }

    /// Sets the maximum accepted blob size
    pub fn with_max_blob_size(mut self, max_blob_size: usize) -> Self {
        self.max_blob_size = max_blob_size;
        self
    }

    /// Sets the number of retries after a failed fetch
    pub fn with_max_retries(mut self, max_retries: u8) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the fixed delay between retries
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Sets the per-attempt fetch timeout
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }
}
