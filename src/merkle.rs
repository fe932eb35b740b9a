//! Fixed-depth sparse Merkle tree over Poseidon.
//!
//! Interior nodes are `Poseidon(left, right, 0)`. Positions past the last
//! populated leaf hold the empty-subtree value for their level, so a tree of
//! depth 26 never materialises more than the populated prefix of each level.

use crate::ethereum::address_to_field;
use crate::nullifier::leaf_hash;
use crate::poseidon::{poseidon3, MissingParameters};
use crate::utils::field_to_hex;
use crate::TREE_DEPTH;
use anyhow::{anyhow, Result};
use ark_bn254::Fr;
use ark_ff::Zero;
use ethers::types::Address;
use log::{debug, info};
use rayon::prelude::*;
use std::fmt;

/// A Merkle membership path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    pub leaf: Fr,
    pub root: Fr,
    pub siblings: Vec<Fr>,
    pub index: usize,
}

impl MerkleProof {
    /// Bit i is set when the node at level i is a right child.
    #[must_use]
    pub fn path_bits(&self) -> Vec<bool> {
        (0..self.siblings.len())
            .map(|level| (self.index >> level) & 1 == 1)
            .collect()
    }

    /// Recomputes the root from the leaf and siblings.
    ///
    /// # Errors
    /// [`MissingParameters`] if the hash tables are unavailable.
    pub fn compute_root(&self) -> Result<Fr, MissingParameters> {
        self.siblings
            .iter()
            .zip(self.path_bits())
            .try_fold(self.leaf, |node, (sibling, is_right)| {
                hash_node(&node, sibling, is_right)
            })
    }
}

impl fmt::Display for MerkleProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MerkleProof:\n  Leaf: {}\n  Root: {}\n  Index: {}\n  Siblings: {}",
            field_to_hex(&self.leaf),
            field_to_hex(&self.root),
            self.index,
            self.siblings.len()
        )
    }
}

/// Hashes `node` with its sibling; `is_right` means `node` is the right child.
///
/// # Errors
/// [`MissingParameters`] if the hash tables are unavailable.
pub fn hash_node(node: &Fr, sibling: &Fr, is_right: bool) -> Result<Fr, MissingParameters> {
    if is_right {
        poseidon3(*sibling, *node, Fr::zero())
    } else {
        poseidon3(*node, *sibling, Fr::zero())
    }
}

/// Empty-subtree roots `zero[0..=depth]`, with `zero[0] = 0`.
///
/// # Errors
/// [`MissingParameters`] if the hash tables are unavailable.
pub fn zero_hashes(depth: usize) -> Result<Vec<Fr>, MissingParameters> {
    let mut zeros = Vec::with_capacity(depth + 1);
    zeros.push(Fr::zero());
    for level in 0..depth {
        let below = zeros[level];
        zeros.push(poseidon3(below, below, Fr::zero())?);
    }
    Ok(zeros)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    depth: usize,
    levels: Vec<Vec<Fr>>,
    zeros: Vec<Fr>,
    root: Fr,
}

impl MerkleTree {
    /// Builds a tree of the production depth.
    ///
    /// # Errors
    /// Returns an error if there are more than `2^26` leaves.
    pub fn new(leaves: Vec<Fr>) -> Result<Self> {
        Self::with_depth(leaves, TREE_DEPTH)
    }

    /// Builds a tree of an explicit depth, for fixtures and small deployments.
    ///
    /// # Errors
    /// Returns an error if `depth` exceeds 26 or the leaves do not fit.
    pub fn with_depth(leaves: Vec<Fr>, depth: usize) -> Result<Self> {
        if depth > TREE_DEPTH {
            return Err(anyhow!(
                "Tree depth {} too large, maximum is {}",
                depth,
                TREE_DEPTH
            ));
        }
        let capacity = 1usize << depth;
        if leaves.len() > capacity {
            return Err(anyhow!(
                "Too many leaves for depth {}: {} > {}",
                depth,
                leaves.len(),
                capacity
            ));
        }

        let zeros = zero_hashes(depth)?;
        let mut levels = Vec::with_capacity(depth + 1);
        levels.push(leaves);

        for level in 0..depth {
            let empty = zeros[level];
            let next = levels[level]
                .par_chunks(2)
                .map(|pair| {
                    let right = pair.get(1).copied().unwrap_or(empty);
                    poseidon3(pair[0], right, Fr::zero())
                })
                .collect::<Result<Vec<Fr>, _>>()?;
            debug!("Hashed level {} ({} nodes)", level + 1, next.len());
            levels.push(next);
        }

        let root = levels[depth].first().copied().unwrap_or(zeros[depth]);
        info!(
            "Built Merkle tree: depth {}, {} leaves, root {}",
            depth,
            levels[0].len(),
            field_to_hex(&root)
        );

        Ok(Self {
            depth,
            levels,
            zeros,
            root,
        })
    }

    /// Builds the eligibility tree for a list of addresses.
    ///
    /// # Errors
    /// Same as [`MerkleTree::new`].
    pub fn from_addresses(addresses: &[Address]) -> Result<Self> {
        let leaves = addresses
            .par_iter()
            .map(|addr| leaf_hash(address_to_field(addr)))
            .collect::<Result<Vec<Fr>, _>>()?;
        Self::new(leaves)
    }

    #[must_use]
    pub fn root(&self) -> Fr {
        self.root
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn leaves(&self) -> &[Fr] {
        &self.levels[0]
    }

    #[must_use]
    pub fn position(&self, leaf: &Fr) -> Option<usize> {
        self.levels[0].iter().position(|l| l == leaf)
    }

    /// Membership path for the leaf at `leaf_index`, or `None` if that slot is empty.
    #[must_use]
    pub fn generate_proof(&self, leaf_index: usize) -> Option<MerkleProof> {
        let leaf = *self.levels[0].get(leaf_index)?;

        let siblings = (0..self.depth)
            .map(|level| {
                let sibling_index = (leaf_index >> level) ^ 1;
                self.levels[level]
                    .get(sibling_index)
                    .copied()
                    .unwrap_or(self.zeros[level])
            })
            .collect();

        Some(MerkleProof {
            leaf,
            root: self.root,
            siblings,
            index: leaf_index,
        })
    }

    /// Checks that `proof` opens to this tree's root.
    #[must_use]
    pub fn verify_proof(&self, proof: &MerkleProof) -> bool {
        proof.root == self.root
            && proof.siblings.len() == self.depth
            && proof.compute_root().map_or(false, |root| root == self.root)
    }
}
