//! ZK Airdrop Verifier
//!
//! Verifies zero-knowledge claims that an anonymous claimant controls an
//! eligible slot in a Poseidon Merkle tree of recipients, bound to a
//! recipient address and a one-time nullifier.
//!
//! # Components
//!
//! - [`MembershipCircuit`]: the proven relation, as an R1CS constraint system
//! - [`MerkleTree`]: depth-26 sparse Poseidon tree over eligible recipients
//! - [`PlonkVerifier`]: snarkjs-compatible PLONK verifier (Keccak transcript)
//! - [`Groth16Verifier`]: Groth16 verifier for the same relation
//! - [`Verifier`]: whichever of the two a deployment is configured for
//! - [`compute_nullifier`]: the double-claim tag derived from the secret
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use zkp_airdrop_verifier::{ProofSystem, ProofVerifier, Verifier};
//!
//! let verifier = Verifier::load(
//!     ProofSystem::Plonk,
//!     Path::new("verification_key.json"),
//!     1024 * 1024,
//! )
//! .unwrap();
//! let accepted = verifier.verify(&[], &[]);
//! assert!(!accepted);
//! ```

pub mod circuit;
pub mod config;
pub mod error;
pub mod ethereum;
pub mod field;
pub mod groth16;
pub mod merkle;
pub mod nullifier;
pub mod plonk;
pub mod poseidon;
pub mod transcript;
pub mod types;
pub mod utils;
pub mod verifier;
pub mod vkey;


pub use circuit::{MembershipCircuit, MembershipWitness};
pub use error::{RejectionKind, VerifyError};
pub use merkle::{MerkleProof, MerkleTree};
pub use nullifier::{compute_nullifier, leaf_hash, Secret};
pub use types::{MerklePathOutput, ProofFile, PublicInputs};
pub use verifier::{Groth16Verifier, PlonkVerifier, ProofSystem, ProofVerifier, Verifier};
pub use vkey::VerificationKey;

/// Depth of the eligibility tree, fixing its capacity at 2^26 recipients.
///
/// Part of the circuit: changing it requires a new trusted setup and new
/// verification keys.
pub const TREE_DEPTH: usize = 26;

/// Domain separator placed in the second Poseidon lane when deriving nullifiers.
pub const NULLIFIER_SALT: u64 = 8795310876811408822;
