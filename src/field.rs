//! BN254 field and curve helpers shared by both verifiers.
//!
//! Proof components arrive as EVM words (`U256`). Decoding is strict: a word
//! is accepted only if it is the canonical representative of its field, and a
//! point only if it satisfies `y² = x³ + 3` over the base field.

use crate::error::VerifyError;
use ark_bn254::{Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ff::{BigInt, BigInteger, PrimeField, Zero};
use ethers::types::U256;

/// Scalar field modulus Q.
pub const SCALAR_MODULUS: U256 = U256(<Fr as PrimeField>::MODULUS.0);

/// Base field modulus QF.
pub const BASE_MODULUS: U256 = U256(<Fq as PrimeField>::MODULUS.0);

/// Decodes a scalar, rejecting `word >= Q`.
pub fn fr_from_word(word: U256, what: &'static str) -> Result<Fr, VerifyError> {
    Fr::from_bigint(BigInt::new(word.0)).ok_or(VerifyError::ScalarOutOfRange { what })
}

/// Decodes a base field element, rejecting `word >= QF`.
pub fn fq_from_word(word: U256, what: &'static str) -> Result<Fq, VerifyError> {
    Fq::from_bigint(BigInt::new(word.0)).ok_or(VerifyError::BaseFieldOutOfRange { what })
}

#[must_use]
pub fn fr_to_word(value: &Fr) -> U256 {
    U256(value.into_bigint().0)
}

#[must_use]
pub fn fq_to_word(value: &Fq) -> U256 {
    U256(value.into_bigint().0)
}

/// Decodes an affine G1 point from its two coordinates.
pub fn g1_from_words(x: U256, y: U256, what: &'static str) -> Result<G1Affine, VerifyError> {
    let point = G1Affine::new_unchecked(fq_from_word(x, what)?, fq_from_word(y, what)?);
    if !point.is_on_curve() {
        return Err(VerifyError::NotOnCurve { what });
    }
    Ok(point)
}

/// Decodes a G2 point given in EIP-197 order (imaginary coefficient first).
pub fn g2_from_words(
    x_c1: U256,
    x_c0: U256,
    y_c1: U256,
    y_c0: U256,
    what: &'static str,
) -> Result<G2Affine, VerifyError> {
    let x = Fq2::new(fq_from_word(x_c0, what)?, fq_from_word(x_c1, what)?);
    let y = Fq2::new(fq_from_word(y_c0, what)?, fq_from_word(y_c1, what)?);
    let point = G2Affine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(VerifyError::NotOnCurve { what });
    }
    if !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(VerifyError::NotInSubgroup { what });
    }
    Ok(point)
}

/// Encodes a G1 point as `[x, y]`. The point at infinity encodes as `[0, 0]`.
#[must_use]
pub fn g1_to_words(point: &G1Affine) -> [U256; 2] {
    if point.infinity {
        return [U256::zero(), U256::zero()];
    }
    [fq_to_word(&point.x), fq_to_word(&point.y)]
}

/// Encodes a G2 point as `[x.c1, x.c0, y.c1, y.c0]`.
#[must_use]
pub fn g2_to_words(point: &G2Affine) -> [U256; 4] {
    if point.infinity {
        return [U256::zero(); 4];
    }
    [
        fq_to_word(&point.x.c1),
        fq_to_word(&point.x.c0),
        fq_to_word(&point.y.c1),
        fq_to_word(&point.y.c0),
    ]
}

/// 32-byte big-endian encoding of a base field element.
#[must_use]
pub fn fq_to_be_bytes(value: &Fq) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&value.into_bigint().to_bytes_be());
    out
}

/// 32-byte big-endian encoding of a scalar.
#[must_use]
pub fn fr_to_be_bytes(value: &Fr) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&value.into_bigint().to_bytes_be());
    out
}

/// Rejects proofs whose words are all zero or all equal.
pub(crate) fn check_not_degenerate(words: &[U256]) -> Result<(), VerifyError> {
    match words.split_first() {
        Some((first, rest)) if rest.iter().any(|w| w != first) => Ok(()),
        _ => Err(VerifyError::DegenerateProof),
    }
}

/// Inverts every element in place with a single field inversion.
///
/// Returns `None`, leaving `values` untouched, if any element is zero.
pub fn batch_inverse(values: &mut [Fr]) -> Option<()> {
    if values.iter().any(Zero::is_zero) {
        return None;
    }
    ark_ff::batch_inversion(values);
    Some(())
}
