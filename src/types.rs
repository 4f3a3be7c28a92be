// Copyright 2025 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Schemas for the externally supplied blobs.
//!
//! The blobs are produced by the offline data-preparation step; their shape is a hard
//! contract but their content is not trusted — batch roots are re-verified before any
//! proof is issued, and parse failures are rejected on ingest rather than surfacing as
//! missing-field errors deep inside tree building.

use crate::common::Hash;
use crate::leaf::ClaimRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Position of one entitlement inside the distribution: which batch owns it and the
/// record's distribution-wide index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimLocation {
    pub batch_index: u64,
    pub index: u64,
}

/// The global address index blob: lowercase address string to location.
///
/// Optional at the source; when absent, the resolver falls back to scanning batches.
pub type AddressIndex = HashMap<String, ClaimLocation>;

/// One partition of the distribution set.
///
/// `records` order defines leaf order and is stable across rebuilds. `root` is the
/// externally claimed Merkle root of this batch's leaves; it must never be trusted
/// blindly.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchData {
    pub batch_index: u64,
    pub root: Hash,
    pub records: Vec<ClaimRecord>,
}

/// Top-level manifest binding the batch roots together.
///
/// Consumed for cross-checking and for learning the batch count during fallback
/// resolution; not required for single-batch proof issuance.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleManifest {
    pub root: Hash,
    pub batch_roots: Vec<Hash>,
    pub total_batches: u64,
}

impl MerkleManifest {
    /// The root the manifest claims for `batch_index`, if the batch is known to it.
    pub fn batch_root(&self, batch_index: u64) -> Option<Hash> {
        self.batch_roots.get(batch_index as usize).copied()
    }
}
