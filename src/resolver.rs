// Copyright 2025 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Address to claim-location resolution.
//!
//! The fast path consults the precomputed global address index blob. When that blob is
//! absent at the source, or exists but carries no entry for the queried address, the
//! resolver degrades to scanning batches in order; an index miss alone is never taken as
//! proof of ineligibility, since the index may be stale or partial. The typed index is
//! deserialized once and both positive and scan-confirmed negative outcomes are
//! memoized, so the linear scan is paid at most once per address per process lifetime.

use crate::common::{to_lower_hex, Address};
use crate::error::Result;
use crate::store::{BlobStore, StoreError};
use crate::types::{AddressIndex, ClaimLocation};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

enum IndexState {
    Unloaded,
    /// The source carries no index blob.
    Absent,
    Loaded(Arc<AddressIndex>),
}

pub struct AddressResolver {
    store: Arc<BlobStore>,
    index: RwLock<IndexState>,
    resolved: RwLock<HashMap<Address, Option<ClaimLocation>>>,
}

impl AddressResolver {
    pub fn new(store: Arc<BlobStore>) -> Self {
        Self {
            store,
            index: RwLock::new(IndexState::Unloaded),
            resolved: RwLock::new(HashMap::new()),
        }
    }

    /// Locate the batch and in-batch record position for `address`.
    ///
    /// Returns `Ok(None)` only once both the index and the batch scan have come up
    /// empty. Only infrastructure failures are errors.
    pub async fn resolve(&self, address: &Address) -> Result<Option<ClaimLocation>> {
        if let Some(outcome) = self.resolved.read().await.get(address) {
            return Ok(*outcome);
        }

        if let Some(location) = self.index_lookup(address).await? {
            self.resolved.write().await.insert(*address, Some(location));
            return Ok(Some(location));
        }

        let outcome = self.scan_batches(address).await?;
        self.resolved.write().await.insert(*address, outcome);
        Ok(outcome)
    }

    /// Drop all memoized resolution state, including the typed index.
    ///
    /// Paired with blob-cache invalidation so a refreshed index or batch set is picked
    /// up instead of stale memoized outcomes.
    pub async fn reset(&self) {
        *self.index.write().await = IndexState::Unloaded;
        self.resolved.write().await.clear();
    }

    /// Look `address` up in the global index, loading and deserializing the index blob
    /// on first use.
    async fn index_lookup(&self, address: &Address) -> Result<Option<ClaimLocation>> {
        {
            let state = self.index.read().await;
            match &*state {
                IndexState::Loaded(index) => {
                    return Ok(index.get(&to_lower_hex(address)).copied())
                }
                IndexState::Absent => return Ok(None),
                IndexState::Unloaded => {}
            }
        }

        let mut state = self.index.write().await;
        if let IndexState::Unloaded = &*state {
            *state = match self.store.address_index().await {
                Ok(index) => IndexState::Loaded(Arc::new(index)),
                Err(StoreError::NotFound { key }) => {
                    warn!("Address index blob {key} is absent, batch scans will drive lookups");
                    IndexState::Absent
                }
                Err(err) => return Err(err.into()),
            };
        }

        match &*state {
            IndexState::Loaded(index) => Ok(index.get(&to_lower_hex(address)).copied()),
            IndexState::Absent => Ok(None),
            IndexState::Unloaded => unreachable!("state was just loaded"),
        }
    }

    /// Walk the batches in order and look for a record owned by `address`.
    ///
    /// O(total records) on a cold lookup; the outcome is memoized by the caller so
    /// repeat queries for the same address skip the scan entirely.
    async fn scan_batches(&self, address: &Address) -> Result<Option<ClaimLocation>> {
        let manifest = match self.store.manifest().await {
            Ok(manifest) => manifest,
            Err(StoreError::NotFound { key }) => {
                warn!("No manifest blob {key} to drive a batch scan for {address}");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        for batch_index in 0..manifest.total_batches {
            let batch = self.store.batch(batch_index).await?;
            let position = batch
                .records
                .iter()
                .position(|record| record.address == *address);
            if let Some(position) = position {
                let location = ClaimLocation {
                    batch_index,
                    index: position as u64,
                };
                debug!("Found {address} in batch {batch_index} at position {position} via scan");
                return Ok(Some(location));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClaimsConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn resolver_for(server: &MockServer) -> AddressResolver {
        let config =
            ClaimsConfig::new(format!("{}/", server.uri()).parse().unwrap()).with_max_retries(0);
        AddressResolver::new(Arc::new(BlobStore::new(config)))
    }

    async fn mount_single_record_batches(server: &MockServer, addresses: &[Address]) {
        let roots: Vec<crate::common::Hash> = addresses
            .iter()
            .map(|_| crate::common::Hash::repeat_byte(0x02))
            .collect();
        let manifest = serde_json::json!({
            "root": crate::common::Hash::repeat_byte(0x01),
            "batchRoots": roots,
            "totalBatches": addresses.len(),
        });
        Mock::given(method("GET"))
            .and(path("/merkle_data.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&manifest))
            .mount(server)
            .await;

        for (batch_index, address) in addresses.iter().enumerate() {
            let batch = serde_json::json!({
                "batchIndex": batch_index,
                "root": crate::common::Hash::repeat_byte(0x02),
                "records": [
                    {"index": batch_index, "address": to_lower_hex(address), "amount": "1"}
                ],
            });
            Mock::given(method("GET"))
                .and(path(format!("/batches/batch_{batch_index}.json")))
                .respond_with(ResponseTemplate::new(200).set_body_json(&batch))
                .mount(server)
                .await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn resolves_via_global_index() {
        let server = MockServer::start().await;
        let body = format!(
            r#"{{"{}": {{"batchIndex": 3, "index": 12}}}}"#,
            to_lower_hex(&addr(0xaa))
        );
        Mock::given(method("GET"))
            .and(path("/address_map.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = resolver_for(&server);
        let location = resolver.resolve(&addr(0xaa)).await.unwrap();
        assert_eq!(
            location,
            Some(ClaimLocation {
                batch_index: 3,
                index: 12
            })
        );
        // The typed index is deserialized once; repeat lookups reuse it.
        assert_eq!(resolver.resolve(&addr(0xaa)).await.unwrap(), location);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn index_miss_falls_back_to_the_batch_scan() {
        let server = MockServer::start().await;
        // The index is stale: it only knows about 0xaa, but 0xbb holds a record.
        let body = format!(
            r#"{{"{}": {{"batchIndex": 0, "index": 0}}}}"#,
            to_lower_hex(&addr(0xaa))
        );
        Mock::given(method("GET"))
            .and(path("/address_map.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        mount_single_record_batches(&server, &[addr(0xaa), addr(0xbb)]).await;

        let resolver = resolver_for(&server);
        let location = resolver.resolve(&addr(0xbb)).await.unwrap();
        assert_eq!(
            location,
            Some(ClaimLocation {
                batch_index: 1,
                index: 0
            })
        );
        // Absent from the index and from every batch: genuinely not eligible.
        assert_eq!(resolver.resolve(&addr(0xcc)).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn index_miss_without_a_manifest_is_not_eligible() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/address_map.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/merkle_data.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let resolver = resolver_for(&server);
        assert_eq!(resolver.resolve(&addr(0xdd)).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn falls_back_to_batch_scan_when_index_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/address_map.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        mount_single_record_batches(&server, &[addr(0x11), addr(0x22)]).await;

        let resolver = resolver_for(&server);
        let location = resolver.resolve(&addr(0x22)).await.unwrap();
        assert_eq!(
            location,
            Some(ClaimLocation {
                batch_index: 1,
                index: 0
            })
        );
        assert_eq!(resolver.resolve(&addr(0x44)).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn scan_outcomes_are_memoized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/address_map.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        mount_single_record_batches(&server, &[addr(0x55)]).await;

        let resolver = resolver_for(&server);
        let first = resolver.resolve(&addr(0x55)).await.unwrap();
        let second = resolver.resolve(&addr(0x55)).await.unwrap();
        assert_eq!(first, second);
        assert!(first.is_some());

        // A scan-confirmed miss is memoized too, and reset() clears both memos.
        assert_eq!(resolver.resolve(&addr(0x66)).await.unwrap(), None);
        resolver.reset().await;
        assert_eq!(resolver.resolve(&addr(0x66)).await.unwrap(), None);
        assert!(resolver.resolve(&addr(0x55)).await.unwrap().is_some());
    }
}
