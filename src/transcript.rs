//! Keccak-256 Fiat-Shamir transcript in the snarkjs byte layout.
//!
//! Points are absorbed as 64 bytes `x || y`, scalars as 32 bytes, all
//! big-endian. Squeezing hashes the buffer, reduces the digest mod Q and
//! clears the buffer for the next round.

use crate::field::{fq_to_be_bytes, fr_to_be_bytes};
use ark_bn254::{Fr, G1Affine};
use ark_ff::PrimeField;
use sha3::{Digest, Keccak256};

#[derive(Debug, Default, Clone)]
pub struct Transcript {
    buffer: Vec<u8>,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_point(&mut self, point: &G1Affine) {
        if point.infinity {
            self.buffer.extend_from_slice(&[0u8; 64]);
            return;
        }
        self.buffer.extend_from_slice(&fq_to_be_bytes(&point.x));
        self.buffer.extend_from_slice(&fq_to_be_bytes(&point.y));
    }

    pub fn append_scalar(&mut self, scalar: &Fr) {
        self.buffer.extend_from_slice(&fr_to_be_bytes(scalar));
    }

    /// Derives the next challenge and resets the buffer.
    pub fn challenge(&mut self) -> Fr {
        let digest = Keccak256::digest(&self.buffer);
        self.buffer.clear();
        Fr::from_be_bytes_mod_order(&digest)
    }
}
