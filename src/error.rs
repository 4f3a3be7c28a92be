// Copyright 2025 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::{Address, Hash};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by proof requests.
///
/// Ineligibility is not an error: `ProofService::claim_proof` returns `Ok(None)` for an
/// address with no entitlement. Everything here is either an infrastructure failure or a
/// data-integrity incident, and the embedding layer can tell the two apart.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid account address: {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Store(#[from] crate::store::StoreError),

    #[error(transparent)]
    Tree(#[from] crate::tree::TreeError),

    // Data corruption: upstream data prep or transport handed us inconsistent state.
    // None of these may ever result in an unverified proof leaving the crate.
    #[error(
        "Batch {batch_index} is corrupt: stored root {stored} does not match recomputed root {computed}"
    )]
    RootMismatch {
        batch_index: u64,
        stored: Hash,
        computed: Hash,
    },

    #[error("Batch {batch_index} has no record at index {index} ({record_count} records)")]
    RecordIndexOutOfBounds {
        batch_index: u64,
        index: u64,
        record_count: usize,
    },

    #[error(
        "Record at index {index} of batch {batch_index} belongs to {record_address}, not the queried {queried}"
    )]
    RecordAddressMismatch {
        batch_index: u64,
        index: u64,
        record_address: Address,
        queried: Address,
    },

    #[error("Blob {key} claims batch index {got}, expected {expected}")]
    BatchIndexMismatch { key: String, expected: u64, got: u64 },

    #[error(
        "Proof for index {index} in batch {batch_index} failed self-verification against the stored root"
    )]
    ProofVerification { batch_index: u64, index: u64 },

    #[error(
        "Manifest disagrees on batch {batch_index} root: manifest {manifest_root}, batch {batch_root}"
    )]
    ManifestRootMismatch {
        batch_index: u64,
        manifest_root: Hash,
        batch_root: Hash,
    },
}

impl Error {
    /// True for the corruption family: inconsistent upstream data, never a transient
    /// condition and never the caller's fault.
    pub fn is_data_corruption(&self) -> bool {
        matches!(
            self,
            Error::RootMismatch { .. }
                | Error::RecordIndexOutOfBounds { .. }
                | Error::RecordAddressMismatch { .. }
                | Error::BatchIndexMismatch { .. }
                | Error::ProofVerification { .. }
                | Error::ManifestRootMismatch { .. }
        )
    }
}
