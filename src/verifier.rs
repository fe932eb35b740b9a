//! The boolean verifier surface shared by the PLONK and Groth16 back ends.

use crate::config::VerifierConfig;
use crate::error::VerifyError;
use crate::groth16::{self, Groth16Proof, Groth16VerificationKey};
use crate::plonk::{self, PlonkProof, PlonkVerificationKey};
use crate::types::PublicInputs;
use crate::vkey::VerificationKey;
use anyhow::{anyhow, Result};
use ethers::types::U256;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Accepts or rejects a flattened proof against three public inputs.
///
/// Rejection never panics; the reason is logged at `debug` level.
pub trait ProofVerifier {
    fn verify(&self, proof: &[U256], public_inputs: &[U256]) -> bool;
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProofSystem {
    #[default]
    Plonk,
    Groth16,
}

impl ProofSystem {
    /// Number of words in this system's flattened proof.
    #[must_use]
    pub fn proof_words(self) -> usize {
        match self {
            Self::Plonk => plonk::PROOF_WORDS,
            Self::Groth16 => groth16::PROOF_WORDS,
        }
    }
}

impl fmt::Display for ProofSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plonk => write!(f, "plonk"),
            Self::Groth16 => write!(f, "groth16"),
        }
    }
}

fn log_outcome(system: ProofSystem, outcome: Result<(), VerifyError>) -> bool {
    match outcome {
        Ok(()) => true,
        Err(e) => {
            debug!("{} proof rejected ({:?}): {}", system, e.kind(), e);
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlonkVerifier {
    key: Arc<PlonkVerificationKey>,
}

impl PlonkVerifier {
    #[must_use]
    pub fn new(key: Arc<PlonkVerificationKey>) -> Self {
        Self { key }
    }

    #[must_use]
    pub fn key(&self) -> &PlonkVerificationKey {
        &self.key
    }

    /// # Errors
    /// The first reason the proof was rejected.
    pub fn verify_words(&self, proof: &[U256], public_inputs: &[U256]) -> Result<(), VerifyError> {
        let public = PublicInputs::from_words(public_inputs)?;
        let proof = PlonkProof::from_words(proof)?;
        self.key.verify_proof(&proof, &public)
    }
}

impl ProofVerifier for PlonkVerifier {
    fn verify(&self, proof: &[U256], public_inputs: &[U256]) -> bool {
        log_outcome(ProofSystem::Plonk, self.verify_words(proof, public_inputs))
    }
}

#[derive(Debug, Clone)]
pub struct Groth16Verifier {
    key: Arc<Groth16VerificationKey>,
}

impl Groth16Verifier {
    #[must_use]
    pub fn new(key: Arc<Groth16VerificationKey>) -> Self {
        Self { key }
    }

    #[must_use]
    pub fn key(&self) -> &Groth16VerificationKey {
        &self.key
    }

    /// # Errors
    /// The first reason the proof was rejected.
    pub fn verify_words(&self, proof: &[U256], public_inputs: &[U256]) -> Result<(), VerifyError> {
        let public = PublicInputs::from_words(public_inputs)?;
        let proof = Groth16Proof::from_words(proof)?;
        self.key.verify_proof(&proof, &public)
    }
}

impl ProofVerifier for Groth16Verifier {
    fn verify(&self, proof: &[U256], public_inputs: &[U256]) -> bool {
        log_outcome(ProofSystem::Groth16, self.verify_words(proof, public_inputs))
    }
}

/// A verifier for whichever proof system the deployment selected.
#[derive(Debug, Clone)]
pub enum Verifier {
    Plonk(PlonkVerifier),
    Groth16(Groth16Verifier),
}

impl Verifier {
    /// Loads the key from `path`; it must be exported for `system`.
    ///
    /// # Errors
    /// Key file errors, or a key exported for the other proof system.
    pub fn load(system: ProofSystem, path: &Path, max_file_size: u64) -> Result<Self> {
        let key = VerificationKey::load(path, max_file_size)?;
        if key.proof_system() != system {
            return Err(anyhow!(
                "Verification key {} is for {}, but {} was requested",
                path.display(),
                key.proof_system(),
                system
            ));
        }
        Ok(Self::from(key))
    }

    /// # Errors
    /// See [`Verifier::load`].
    pub fn from_config(config: &VerifierConfig) -> Result<Self> {
        Self::load(
            config.proof_system,
            &config.verification_key,
            config.max_key_file_size,
        )
    }

    #[must_use]
    pub fn proof_system(&self) -> ProofSystem {
        match self {
            Self::Plonk(_) => ProofSystem::Plonk,
            Self::Groth16(_) => ProofSystem::Groth16,
        }
    }

    /// # Errors
    /// The first reason the proof was rejected.
    pub fn verify_words(&self, proof: &[U256], public_inputs: &[U256]) -> Result<(), VerifyError> {
        match self {
            Self::Plonk(inner) => inner.verify_words(proof, public_inputs),
            Self::Groth16(inner) => inner.verify_words(proof, public_inputs),
        }
    }
}

impl From<VerificationKey> for Verifier {
    fn from(key: VerificationKey) -> Self {
        match key {
            VerificationKey::Plonk(key) => Self::Plonk(PlonkVerifier::new(Arc::new(key))),
            VerificationKey::Groth16(key) => Self::Groth16(Groth16Verifier::new(Arc::new(key))),
        }
    }
}

impl ProofVerifier for Verifier {
    fn verify(&self, proof: &[U256], public_inputs: &[U256]) -> bool {
        match self {
            Self::Plonk(inner) => inner.verify(proof, public_inputs),
            Self::Groth16(inner) => inner.verify(proof, public_inputs),
        }
    }
}
