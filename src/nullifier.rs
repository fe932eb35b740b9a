//! Leaf and nullifier derivation.
//!
//! A claimant's leaf is `Poseidon(recipient, 0, 0)` and their nullifier is
//! `Poseidon(secret, NULLIFIER_SALT, 0)`. The salt occupies the second lane so
//! a nullifier can never equal any leaf or interior node of the tree.

use crate::poseidon::{poseidon3, MissingParameters};
use crate::utils::validate_and_strip_hex;
use crate::NULLIFIER_SALT;
use anyhow::{anyhow, Result};
use ark_bn254::Fr;
use ark_ff::{PrimeField, Zero};
use std::fmt;

/// Hex length of a 32-byte secret.
pub const SECRET_HEX_LENGTH: usize = 64;

/// Longest run of repeated or consecutive bytes accepted in a secret.
const MAX_PATTERN_RUN: usize = 7;

/// The claimant's private scalar. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Fr);

impl Secret {
    /// Parses a 32-byte hex secret (optional `0x` prefix). The value is
    /// reduced mod Q, as circom witness inputs are.
    ///
    /// # Errors
    /// Rejects malformed hex, values that reduce to zero, and byte strings
    /// with long repeated or sequential runs.
    pub fn from_hex(input: &str) -> Result<Self> {
        let stripped = validate_and_strip_hex(input, SECRET_HEX_LENGTH)?;
        let bytes = hex::decode(&stripped)?;
        Self::from_be_bytes(&bytes)
    }

    /// # Errors
    /// Same checks as [`Secret::from_hex`].
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(anyhow!("Secret must be 32 bytes, got {}", bytes.len()));
        }
        if bytes.iter().all(|&b| b == 0) {
            return Err(anyhow!("Secret cannot be zero"));
        }
        check_weak_patterns(bytes)?;

        let reduced = Fr::from_be_bytes_mod_order(bytes);
        if reduced.is_zero() {
            return Err(anyhow!("Secret reduces to zero in the scalar field"));
        }
        Ok(Self(reduced))
    }

    /// Wraps a field element directly. Intended for fixtures and benchmarks.
    #[must_use]
    pub fn from_field(value: Fr) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_field(&self) -> Fr {
        self.0
    }

    /// # Errors
    /// See [`compute_nullifier`].
    pub fn nullifier(&self) -> Result<Fr, MissingParameters> {
        compute_nullifier(self.0)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

fn check_weak_patterns(bytes: &[u8]) -> Result<()> {
    let mut repeated = 0;
    let mut sequential = 0;
    for pair in bytes.windows(2) {
        repeated = if pair[0] == pair[1] { repeated + 1 } else { 0 };
        let step = pair[1].wrapping_sub(pair[0]);
        sequential = if step == 1 || step == u8::MAX {
            sequential + 1
        } else {
            0
        };
        if repeated > MAX_PATTERN_RUN {
            return Err(anyhow!("Secret contains a repeated byte pattern"));
        }
        if sequential > MAX_PATTERN_RUN {
            return Err(anyhow!("Secret contains a sequential byte pattern"));
        }
    }
    Ok(())
}

/// `Poseidon(recipient, 0, 0)`.
///
/// # Errors
/// [`MissingParameters`] if the hash tables are unavailable.
pub fn leaf_hash(recipient: Fr) -> Result<Fr, MissingParameters> {
    poseidon3(recipient, Fr::zero(), Fr::zero())
}

/// `Poseidon(secret, NULLIFIER_SALT, 0)`.
///
/// # Errors
/// [`MissingParameters`] if the hash tables are unavailable.
pub fn compute_nullifier(secret: Fr) -> Result<Fr, MissingParameters> {
    poseidon3(secret, Fr::from(NULLIFIER_SALT), Fr::zero())
}
