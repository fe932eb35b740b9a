//! Poseidon over the BN254 scalar field, compatible with circomlib's `Poseidon(3)`.
//!
//! The permutation runs on a width-4 state `[0, a, b, c]` with 8 full and 56
//! partial rounds of the x⁵ S-box; the digest is `state[0]`. Round constants and
//! the MDS matrix are taken from `light-poseidon`'s `bn254_x5` tables so the
//! native hash, the R1CS gadget and external circom provers agree bit-for-bit.

use ark_bn254::Fr;
use ark_ff::{Field, Zero};
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use ark_relations::r1cs::SynthesisError;
use light_poseidon::parameters::bn254_x5::get_poseidon_parameters;
use light_poseidon::PoseidonParameters;
use std::sync::OnceLock;
use thiserror::Error;

/// State width for three inputs plus the domain tag.
pub const WIDTH: usize = 4;

/// The parameter tables carry no entry for the requested width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no Poseidon parameters for state width {0}")]
pub struct MissingParameters(pub usize);

static PARAMETERS: OnceLock<Option<PoseidonParameters<Fr>>> = OnceLock::new();

fn parameters() -> Result<&'static PoseidonParameters<Fr>, MissingParameters> {
    PARAMETERS
        .get_or_init(|| get_poseidon_parameters::<Fr>(WIDTH as u8).ok())
        .as_ref()
        .ok_or(MissingParameters(WIDTH))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Round {
    Full,
    Partial,
}

fn schedule(params: &PoseidonParameters<Fr>) -> impl Iterator<Item = (usize, Round)> {
    let partial = params.partial_rounds;
    let half = params.full_rounds / 2;
    let total = params.full_rounds + partial;
    (0..total).map(move |r| {
        if r < half || r >= half + partial {
            (r, Round::Full)
        } else {
            (r, Round::Partial)
        }
    })
}

/// Native `Poseidon(a, b, c)`.
///
/// # Errors
/// [`MissingParameters`] if the width-4 tables are unavailable.
pub fn poseidon3(a: Fr, b: Fr, c: Fr) -> Result<Fr, MissingParameters> {
    let params = parameters()?;
    let mut state = [Fr::zero(), a, b, c];

    for (round, kind) in schedule(params) {
        for (i, lane) in state.iter_mut().enumerate() {
            *lane += params.ark[round * WIDTH + i];
        }
        match kind {
            Round::Full => state.iter_mut().for_each(|lane| *lane = sbox(*lane)),
            Round::Partial => state[0] = sbox(state[0]),
        }
        state = mix(&params.mds, &state);
    }

    Ok(state[0])
}

fn sbox(x: Fr) -> Fr {
    let x2 = x.square();
    x2.square() * x
}

fn mix(mds: &[Vec<Fr>], state: &[Fr; WIDTH]) -> [Fr; WIDTH] {
    let mut out = [Fr::zero(); WIDTH];
    for (i, row) in mds.iter().enumerate().take(WIDTH) {
        out[i] = row.iter().zip(state.iter()).map(|(m, s)| *m * s).sum();
    }
    out
}

/// In-circuit `Poseidon(a, b, c)`; costs three constraints per S-box.
///
/// # Errors
/// Constraint-system failures, or [`SynthesisError::Unsatisfiable`] if the
/// parameter tables are unavailable.
pub fn poseidon3_gadget(
    a: &FpVar<Fr>,
    b: &FpVar<Fr>,
    c: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    let params = parameters().map_err(|_| SynthesisError::Unsatisfiable)?;
    let mut state = vec![FpVar::Constant(Fr::zero()), a.clone(), b.clone(), c.clone()];

    for (round, kind) in schedule(params) {
        for (i, lane) in state.iter_mut().enumerate() {
            *lane += params.ark[round * WIDTH + i];
        }
        match kind {
            Round::Full => {
                for lane in state.iter_mut() {
                    *lane = sbox_gadget(lane)?;
                }
            }
            Round::Partial => state[0] = sbox_gadget(&state[0])?,
        }
        state = params
            .mds
            .iter()
            .take(WIDTH)
            .map(|row| {
                row.iter()
                    .zip(state.iter())
                    .fold(FpVar::Constant(Fr::zero()), |acc, (m, s)| acc + s * *m)
            })
            .collect();
    }

    Ok(state.swap_remove(0))
}

fn sbox_gadget(x: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    let x2 = x.square()?;
    let x4 = x2.square()?;
    Ok(x4 * x)
}
