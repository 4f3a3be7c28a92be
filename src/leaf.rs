// Copyright 2025 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Deterministic leaf encoding for claim records.
//!
//! One leaf is the keccak256 of the tightly packed `uint256 index ++ address ++
//! uint256 amount` — the `abi.encodePacked` layout the on-chain verifier hashes at claim
//! time. Field widths are fixed, so the encoding is unambiguous without any length
//! prefixing.

use crate::common::{Address, Amount, Hash};
use alloy::primitives::keccak256;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

/// One entitlement in the distribution set.
///
/// `index` is unique across the entire distribution, not just within a batch. `amount`
/// travels as a decimal string on the wire; it must never pass through a float.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub index: u64,
    pub address: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
}

impl ClaimRecord {
    /// Hash of this record's leaf encoding.
    pub fn leaf_hash(&self) -> Hash {
        leaf_hash(self.index, &self.address, &self.amount)
    }
}

/// Encode `(index, address, amount)` and hash it into a leaf.
///
/// Layout: 32-byte big-endian index, raw 20-byte address, 32-byte big-endian amount.
pub fn leaf_hash(index: u64, address: &Address, amount: &Amount) -> Hash {
    let mut packed = [0u8; 32 + 20 + 32];
    packed[..32].copy_from_slice(&Amount::from(index).to_be_bytes::<32>());
    packed[32..52].copy_from_slice(address.as_slice());
    packed[52..].copy_from_slice(&amount.to_be_bytes::<32>());
    keccak256(packed)
}
