// Copyright 2025 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Per-batch Merkle tree with the sorted-pairs hashing rule.
//!
//! At every level, adjacent hashes are paired left to right and each parent is
//! `keccak256(min(left, right) ++ max(left, right))`. Ordering the pair by value removes
//! left/right positional bookkeeping from proofs: verification is a plain fold over the
//! sibling path. A trailing odd node is promoted unchanged to the next level, matching
//! the convention the on-chain verifier commits to.

use crate::common::Hash;
use alloy::primitives::keccak256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Cannot build a tree with no leaves")]
    NoLeaves,
    #[error("Invalid leaf index: {index} (tree has {leaf_count} leaves)")]
    InvalidLeafIndex { index: usize, leaf_count: usize },
}

/// Hash a sorted pair into its parent node.
fn combine(left: &Hash, right: &Hash) -> Hash {
    let (lo, hi) = if left <= right {
        (left, right)
    } else {
        (right, left)
    };
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(lo.as_slice());
    data[32..].copy_from_slice(hi.as_slice());
    keccak256(data)
}

/// A binary Merkle tree over a batch's leaf hashes.
///
/// All levels are retained so that proof extraction is a walk from any leaf to the root.
/// Construction is deterministic: the same leaves in the same order always produce the
/// same root — leaf order is part of the committed structure.
pub struct BatchTree {
    /// `levels[0]` are the leaves; the last level is the single root.
    levels: Vec<Vec<Hash>>,
}

impl BatchTree {
    /// Build the tree bottom-up from leaf hashes.
    ///
    /// A single-leaf batch is valid: its root is the leaf itself and every proof is
    /// empty. An empty batch is not.
    pub fn from_leaves(leaves: Vec<Hash>) -> Result<Self, TreeError> {
        if leaves.is_empty() {
            return Err(TreeError::NoLeaves);
        }

        let mut levels = vec![leaves];
        while levels[levels.len() - 1].len() > 1 {
            let level = &levels[levels.len() - 1];
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            for pair in level.chunks(2) {
                match pair {
                    [left, right] => next.push(combine(left, right)),
                    [odd] => next.push(*odd),
                    _ => unreachable!("chunks(2) yields one or two items"),
                }
            }
            levels.push(next);
        }

        Ok(Self { levels })
    }

    pub fn root(&self) -> Hash {
        self.levels[self.levels.len() - 1][0]
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Sibling path for the leaf at `leaf_index`, ordered leaf-to-root.
    ///
    /// Levels where the target occupies a trailing odd slot contribute no sibling; the
    /// node was promoted unchanged and the verifier's fold skips that level too.
    pub fn proof(&self, leaf_index: usize) -> Result<Vec<Hash>, TreeError> {
        let leaf_count = self.leaf_count();
        if leaf_index >= leaf_count {
            return Err(TreeError::InvalidLeafIndex {
                index: leaf_index,
                leaf_count,
            });
        }

        let mut proof = Vec::new();
        let mut index = leaf_index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = if index % 2 == 0 { index + 1 } else { index - 1 };
            if sibling < level.len() {
                proof.push(level[sibling]);
            }
            index /= 2;
        }
        Ok(proof)
    }
}

/// Replay the fold: combine the leaf with each sibling under the sorted-pairs rule and
/// compare the result to the claimed root.
///
/// This runs on every proof before it leaves the crate; a `false` here means the batch
/// data and its stored root disagree.
pub fn verify_proof(leaf: &Hash, proof: &[Hash], root: &Hash) -> bool {
    let mut acc = *leaf;
    for sibling in proof {
        acc = combine(&acc, sibling);
    }
    acc == *root
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;

    fn make_leaves(count: usize) -> Vec<Hash> {
        (0..count)
            .map(|i| keccak256((i as u64).to_be_bytes()))
            .collect()
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(
            BatchTree::from_leaves(vec![]),
            Err(TreeError::NoLeaves)
        ));
    }

    #[test]
    fn single_leaf_root_is_the_leaf() {
        let leaves = make_leaves(1);
        let tree = BatchTree::from_leaves(leaves.clone()).unwrap();
        assert_eq!(tree.root(), leaves[0]);
        assert_eq!(tree.proof(0).unwrap(), Vec::<Hash>::new());
        assert!(verify_proof(&leaves[0], &[], &tree.root()));
    }

    #[test]
    fn two_leaf_root_is_sorted_pair_hash() {
        let leaves = make_leaves(2);
        let tree = BatchTree::from_leaves(leaves.clone()).unwrap();

        let (lo, hi) = if leaves[0] <= leaves[1] {
            (leaves[0], leaves[1])
        } else {
            (leaves[1], leaves[0])
        };
        let mut data = [0u8; 64];
        data[..32].copy_from_slice(lo.as_slice());
        data[32..].copy_from_slice(hi.as_slice());
        assert_eq!(tree.root(), keccak256(data));

        assert_eq!(tree.proof(0).unwrap(), vec![leaves[1]]);
        assert_eq!(tree.proof(1).unwrap(), vec![leaves[0]]);
    }

    #[test]
    fn every_leaf_proves_against_the_root() {
        // Covers power-of-two, odd and prime leaf counts; odd counts exercise promotion.
        for count in [1, 2, 3, 4, 5, 7, 8, 16, 33] {
            let leaves = make_leaves(count);
            let tree = BatchTree::from_leaves(leaves.clone()).unwrap();
            let root = tree.root();
            for (i, leaf) in leaves.iter().enumerate() {
                let proof = tree.proof(i).unwrap();
                assert!(
                    verify_proof(leaf, &proof, &root),
                    "proof for leaf {i} of {count} should verify"
                );
            }
        }
    }

    #[test]
    fn root_is_order_sensitive() {
        let leaves = make_leaves(8);
        let mut permuted = leaves.clone();
        permuted.swap(2, 5);

        let original = BatchTree::from_leaves(leaves).unwrap();
        let swapped = BatchTree::from_leaves(permuted).unwrap();
        assert_ne!(original.root(), swapped.root());
    }

    #[test]
    fn rebuild_is_deterministic() {
        let leaves = make_leaves(100);
        let first = BatchTree::from_leaves(leaves.clone()).unwrap();
        let second = BatchTree::from_leaves(leaves).unwrap();
        assert_eq!(first.root(), second.root());
    }

    #[test]
    fn wrong_leaf_fails_verification() {
        let leaves = make_leaves(8);
        let tree = BatchTree::from_leaves(leaves.clone()).unwrap();
        let proof = tree.proof(3).unwrap();
        assert!(!verify_proof(&leaves[4], &proof, &tree.root()));
    }

    #[test]
    fn tampered_root_fails_verification() {
        let leaves = make_leaves(8);
        let tree = BatchTree::from_leaves(leaves.clone()).unwrap();
        let proof = tree.proof(0).unwrap();
        let bogus_root = keccak256(b"bogus");
        assert!(!verify_proof(&leaves[0], &proof, &bogus_root));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let tree = BatchTree::from_leaves(make_leaves(4)).unwrap();
        assert!(matches!(
            tree.proof(4),
            Err(TreeError::InvalidLeafIndex {
                index: 4,
                leaf_count: 4
            })
        ));
    }
}
