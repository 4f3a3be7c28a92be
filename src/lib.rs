// Copyright 2025 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Batch-partitioned Merkle membership proofs for token distributions
//!
//! A token distribution too large for a single proof-friendly structure is split into
//! batches, each committed by its own Merkle tree, with a top-level manifest binding the
//! batch roots. This crate resolves an account address to its owning batch, rebuilds that
//! batch's tree, extracts the sibling path for the target record and self-verifies it
//! against the batch's committed root before handing the proof to a caller.
//!
//! Batch blobs are fetched from a remote blob source through a read-through,
//! content-addressed in-memory cache: each blob is fetched at most once per process
//! lifetime unless explicitly invalidated.
//!
//! - A missing entitlement is `Ok(None)`, never an error.
//! - A batch whose recomputed root disagrees with its stored root is corrupt; no proof
//!   is ever issued from it.

#[macro_use]
extern crate tracing;

pub mod common;
pub mod config;
pub mod error;
pub mod leaf;
pub mod resolver;
pub mod service;
pub mod store;
pub mod tree;
pub mod types;

pub use common::{Address, Amount, Hash};
pub use config::ClaimsConfig;
pub use error::{Error, Result};
pub use leaf::{leaf_hash, ClaimRecord};
pub use resolver::AddressResolver;
pub use service::{ClaimProof, ProofService};
pub use store::BlobStore;
pub use tree::{verify_proof, BatchTree};
pub use types::{AddressIndex, BatchData, ClaimLocation, MerkleManifest};
