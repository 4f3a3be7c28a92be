// Copyright 2025 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Proof issuance.
//!
//! The service ties the resolver, the blob store and the tree together: resolve the
//! address, fetch its batch, rebuild the batch tree from the raw records, check the
//! recomputed root against the stored one, extract the sibling path and self-verify it.
//! A proof that fails any of these checks never leaves the crate.

use crate::common::{parse_address, to_lower_hex, Address, Amount, Hash};
use crate::config::ClaimsConfig;
use crate::error::{Error, Result};
use crate::resolver::AddressResolver;
use crate::store::{BlobStore, StoreError};
use crate::tree::{verify_proof, BatchTree};
use serde::{Deserialize, Serialize, Serializer};
use serde_with::{serde_as, DisplayFromStr};
use std::sync::Arc;

fn serialize_lower_address<S: Serializer>(
    address: &Address,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_lower_hex(address))
}

/// A verified membership proof, ready for a claim transaction.
///
/// Constructed fresh per request; batch data is cached, proofs are not.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimProof {
    /// Distribution-wide record index, as hashed into the leaf.
    pub index: u64,
    #[serde(serialize_with = "serialize_lower_address")]
    pub address: Address,
    /// Entitlement in the token's smallest unit, as a decimal string.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
    /// Sibling path from the leaf to the batch root, ordered leaf-to-root.
    pub proof: Vec<Hash>,
    pub batch_index: u64,
    pub batch_root: Hash,
    /// Human-readable rendering of `amount` at 18 decimals. Presentation only; not part
    /// of what is hashed or proved.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub amount_in_ether: Option<String>,
}

pub struct ProofService {
    store: Arc<BlobStore>,
    resolver: AddressResolver,
}

impl ProofService {
    pub fn new(config: ClaimsConfig) -> Self {
        let store = Arc::new(BlobStore::new(config));
        let resolver = AddressResolver::new(store.clone());
        Self { store, resolver }
    }

    pub fn store(&self) -> &Arc<BlobStore> {
        &self.store
    }

    /// Issue a verified proof for `address`, or `Ok(None)` if it holds no entitlement.
    ///
    /// The input address may be any case; lookups are case-insensitive.
    pub async fn claim_proof(&self, address: &str) -> Result<Option<ClaimProof>> {
        let address = parse_address(address)?;

        let location = match self.resolver.resolve(&address).await? {
            Some(location) => location,
            None => {
                debug!("No entitlement for {address}");
                return Ok(None);
            }
        };
        let batch_index = location.batch_index;

        let batch = self.store.batch(batch_index).await?;
        if batch.batch_index != batch_index {
            return Err(Error::BatchIndexMismatch {
                key: self.store.config().batch_key(batch_index),
                expected: batch_index,
                got: batch.batch_index,
            });
        }

        let position = location.index as usize;
        let record = batch
            .records
            .get(position)
            .ok_or(Error::RecordIndexOutOfBounds {
                batch_index,
                index: location.index,
                record_count: batch.records.len(),
            })?
            .clone();
        if record.address != address {
            return Err(Error::RecordAddressMismatch {
                batch_index,
                index: location.index,
                record_address: record.address,
                queried: address,
            });
        }

        // Rebuild the whole batch tree from the raw records. The stored root is a claim
        // to be checked, not an input to proof construction.
        let leaves: Vec<Hash> = batch.records.iter().map(|r| r.leaf_hash()).collect();
        let tree = BatchTree::from_leaves(leaves)?;
        let computed = tree.root();
        if computed != batch.root {
            error!(
                "Batch {batch_index} is corrupt: stored root {} vs recomputed {computed}",
                batch.root
            );
            return Err(Error::RootMismatch {
                batch_index,
                stored: batch.root,
                computed,
            });
        }

        let proof = tree.proof(position)?;
        if !verify_proof(&record.leaf_hash(), &proof, &batch.root) {
            error!(
                "Self-verification failed for index {} in batch {batch_index}",
                record.index
            );
            return Err(Error::ProofVerification {
                batch_index,
                index: record.index,
            });
        }

        self.cross_check_manifest(batch_index, &batch.root).await?;

        info!(
            "Issued proof for {address}: index {}, batch {batch_index}, {} siblings",
            record.index,
            proof.len()
        );
        Ok(Some(ClaimProof {
            index: record.index,
            address: record.address,
            amount: record.amount,
            proof,
            batch_index,
            batch_root: batch.root,
            amount_in_ether: Some(alloy::primitives::utils::format_ether(record.amount)),
        }))
    }

    /// Compare the batch's root against what the top-level manifest claims for it.
    ///
    /// A source without a manifest is tolerated; a manifest that disagrees is not.
    async fn cross_check_manifest(&self, batch_index: u64, batch_root: &Hash) -> Result<()> {
        let manifest = match self.store.manifest().await {
            Ok(manifest) => manifest,
            Err(StoreError::NotFound { key }) => {
                debug!("No manifest blob {key} at the source, skipping root cross-check");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        match manifest.batch_root(batch_index) {
            Some(manifest_root) if manifest_root != *batch_root => {
                error!(
                    "Manifest disagrees on batch {batch_index} root: {manifest_root} vs {batch_root}"
                );
                Err(Error::ManifestRootMismatch {
                    batch_index,
                    manifest_root,
                    batch_root: *batch_root,
                })
            }
            Some(_) => Ok(()),
            None => {
                warn!("Manifest carries no root for batch {batch_index}");
                Ok(())
            }
        }
    }

    /// Evict cached blobs. `None` clears everything; returns the number of entries
    /// evicted.
    ///
    /// Memoized address resolutions are dropped alongside, so refreshed blobs take
    /// effect on the next lookup.
    pub async fn invalidate_cache(&self, key: Option<&str>) -> usize {
        self.resolver.reset().await;
        self.store.invalidate(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn proof_serializes_with_wire_field_names() {
        let proof = ClaimProof {
            index: 3,
            address: Address::repeat_byte(0xab),
            amount: Amount::from_str("1000000000000000000").unwrap(),
            proof: vec![Hash::repeat_byte(1), Hash::repeat_byte(2)],
            batch_index: 1,
            batch_root: Hash::repeat_byte(9),
            amount_in_ether: Some("1.000000000000000000".to_string()),
        };

        let value = serde_json::to_value(&proof).unwrap();
        assert_eq!(value["index"], 3);
        assert_eq!(value["address"], "0xabababababababababababababababababababab");
        assert_eq!(value["amount"], "1000000000000000000");
        assert_eq!(value["batchIndex"], 1);
        assert_eq!(value["amountInEther"], "1.000000000000000000");
        assert_eq!(value["proof"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn ether_rendering_is_omitted_when_absent() {
        let proof = ClaimProof {
            index: 0,
            address: Address::repeat_byte(0x01),
            amount: Amount::from(1u64),
            proof: vec![],
            batch_index: 0,
            batch_root: Hash::repeat_byte(0),
            amount_in_ether: None,
        };
        let value = serde_json::to_value(&proof).unwrap();
        assert!(value.get("amountInEther").is_none());
    }
}
