//! Rejection reasons produced while checking a proof.
//!
//! The boolean verifier surface collapses all of these into `false`; the typed
//! entry points return them so a calling layer can decide how much to reveal.

use thiserror::Error;

/// Coarse classification of a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Malformed encoding: wrong length, non-canonical field element, point off the curve.
    Structural,
    /// Well-formed but trivially forgeable input, rejected before any algebra.
    Degenerate,
    /// The algebraic checks did not hold.
    Cryptographic,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("proof must contain {expected} words, got {got}")]
    ProofLength { expected: usize, got: usize },

    #[error("expected {expected} public inputs, got {got}")]
    PublicInputCount { expected: usize, got: usize },

    #[error("{what} is not a canonical scalar field element")]
    ScalarOutOfRange { what: &'static str },

    #[error("{what} is not a canonical base field element")]
    BaseFieldOutOfRange { what: &'static str },

    #[error("{what} is not on the BN254 curve")]
    NotOnCurve { what: &'static str },

    #[error("{what} is not in the prime-order subgroup")]
    NotInSubgroup { what: &'static str },

    #[error("proof words are all zero or all identical")]
    DegenerateProof,

    #[error("nullifier must be non-zero")]
    ZeroNullifier,

    #[error("evaluation challenge falls inside the evaluation domain")]
    DegenerateChallenge,

    #[error("multi-scalar multiplication received mismatched inputs")]
    Msm,

    #[error("pairing check failed")]
    PairingMismatch,
}

impl VerifyError {
    #[must_use]
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::ProofLength { .. }
            | Self::PublicInputCount { .. }
            | Self::ScalarOutOfRange { .. }
            | Self::BaseFieldOutOfRange { .. }
            | Self::NotOnCurve { .. }
            | Self::NotInSubgroup { .. } => RejectionKind::Structural,
            Self::DegenerateProof | Self::ZeroNullifier | Self::DegenerateChallenge => {
                RejectionKind::Degenerate
            }
            Self::Msm | Self::PairingMismatch => RejectionKind::Cryptographic,
        }
    }
}
