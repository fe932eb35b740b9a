//! Public inputs and the JSON documents exchanged with provers and tree builders.

use crate::config::SecurityConfig;
use crate::error::VerifyError;
use crate::ethereum::{address_to_field, parse_address};
use crate::field::{fr_from_word, fr_to_word};
use crate::merkle::MerkleProof;
use crate::utils::{field_to_hex, parse_field, parse_words};
use crate::verifier::ProofSystem;
use anyhow::{anyhow, Context, Result};
use ark_bn254::Fr;
use ark_ff::Zero;
use ethers::types::{Address, U256};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The three public inputs of the membership relation, in transcript order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicInputs {
    pub merkle_root: Fr,
    pub recipient: Fr,
    pub nullifier: Fr,
}

impl PublicInputs {
    pub const COUNT: usize = 3;

    #[must_use]
    pub fn new(merkle_root: Fr, recipient: &Address, nullifier: Fr) -> Self {
        Self {
            merkle_root,
            recipient: address_to_field(recipient),
            nullifier,
        }
    }

    /// Decodes `[merkle_root, recipient, nullifier]`.
    ///
    /// # Errors
    /// Wrong count, any word `>= Q`, or a zero nullifier.
    pub fn from_words(words: &[U256]) -> Result<Self, VerifyError> {
        let [root, recipient, nullifier] = words else {
            return Err(VerifyError::PublicInputCount {
                expected: Self::COUNT,
                got: words.len(),
            });
        };
        let inputs = Self {
            merkle_root: fr_from_word(*root, "merkle_root")?,
            recipient: fr_from_word(*recipient, "recipient")?,
            nullifier: fr_from_word(*nullifier, "nullifier")?,
        };
        inputs.check()?;
        Ok(inputs)
    }

    /// Checks that hold for every well-formed claim.
    ///
    /// # Errors
    /// [`VerifyError::ZeroNullifier`].
    pub fn check(&self) -> Result<(), VerifyError> {
        if self.nullifier.is_zero() {
            return Err(VerifyError::ZeroNullifier);
        }
        Ok(())
    }

    #[must_use]
    pub fn to_array(&self) -> [Fr; 3] {
        [self.merkle_root, self.recipient, self.nullifier]
    }

    #[must_use]
    pub fn to_words(&self) -> [U256; 3] {
        self.to_array().map(|value| fr_to_word(&value))
    }

    /// snarkjs `public.json` form: decimal strings.
    #[must_use]
    pub fn to_signals(&self) -> Vec<String> {
        self.to_words().iter().map(U256::to_string).collect()
    }
}

/// A proof as produced by the external prover, plus claim metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofFile {
    pub proof_system: ProofSystem,
    /// Flattened proof words, decimal or 0x-hex.
    pub proof: Vec<String>,
    /// `[merkle_root, recipient, nullifier]`
    pub public_signals: Vec<String>,
    /// Recipient address, if the prover recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    /// Unix timestamp at which the proof was generated.
    pub timestamp: u64,
}

impl ProofFile {
    /// Reads a proof file, refusing anything larger than `max_file_size`.
    ///
    /// # Errors
    /// I/O, size or JSON errors.
    pub fn load(path: &Path, max_file_size: u64) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to read proof file: {}", path.display()))?;
        if metadata.len() > max_file_size {
            return Err(anyhow!(
                "Proof file too large: {} bytes (max {})",
                metadata.len(),
                max_file_size
            ));
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read proof file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse proof file: {}", path.display()))
    }

    /// # Errors
    /// I/O or serialisation errors.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize proof")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write proof file: {}", path.display()))
    }

    /// # Errors
    /// Returns the first word that fails to parse.
    pub fn proof_words(&self) -> Result<Vec<U256>> {
        parse_words(&self.proof).context("Invalid proof word")
    }

    /// # Errors
    /// Returns the first signal that fails to parse.
    pub fn public_words(&self) -> Result<Vec<U256>> {
        parse_words(&self.public_signals).context("Invalid public signal")
    }

    /// Checks metadata consistency: field counts, timestamp window, and that
    /// the recorded recipient matches the recipient public signal.
    ///
    /// # Errors
    /// Returns an error describing the first failed check.
    pub fn validate(&self, security: &SecurityConfig) -> Result<()> {
        debug!("Starting proof file validation");
        debug!("Proof system: {}", self.proof_system);
        debug!("Proof words: {}", self.proof.len());
        debug!("Timestamp: {}", self.timestamp);

        if self.proof.len() != self.proof_system.proof_words() {
            return Err(anyhow!(
                "{} proof must have {} words, got {}",
                self.proof_system,
                self.proof_system.proof_words(),
                self.proof.len()
            ));
        }
        if self.public_signals.len() != PublicInputs::COUNT {
            return Err(anyhow!(
                "Expected {} public signals [merkle_root, recipient, nullifier], got {}",
                PublicInputs::COUNT,
                self.public_signals.len()
            ));
        }

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|e| anyhow!("System clock unavailable: {}", e))?;
        debug!("Current timestamp: {}", now);

        if self.timestamp > now.saturating_add(security.timestamp_tolerance_secs) {
            return Err(anyhow!(
                "Timestamp is too far in the future: {} (current: {}, tolerance: {}s)",
                self.timestamp,
                now,
                security.timestamp_tolerance_secs
            ));
        }
        if now > self.timestamp.saturating_add(security.timestamp_max_age_secs) {
            return Err(anyhow!(
                "Timestamp is too old: {} (current: {}, max age: {}s)",
                self.timestamp,
                now,
                security.timestamp_max_age_secs
            ));
        }

        if let Some(recipient) = &self.recipient {
            let address = parse_address(recipient)?;
            let signal = parse_field(&self.public_signals[1])
                .context("Recipient public signal is not a field element")?;
            if address_to_field(&address) != signal {
                return Err(anyhow!(
                    "Recipient {} does not match the recipient public signal",
                    recipient
                ));
            }
        }

        Ok(())
    }
}

/// A membership path serialised for an external prover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePathOutput {
    pub merkle_root: String,
    pub recipient: String,
    pub leaf: String,
    pub leaf_index: usize,
    pub siblings: Vec<String>,
    /// Bit i is 1 when the node at level i is a right child.
    pub path_indices: Vec<u8>,
}

impl MerklePathOutput {
    #[must_use]
    pub fn new(proof: &MerkleProof, recipient: &Address) -> Self {
        Self {
            merkle_root: field_to_hex(&proof.root),
            recipient: format!("{recipient:?}"),
            leaf: field_to_hex(&proof.leaf),
            leaf_index: proof.index,
            siblings: proof.siblings.iter().map(field_to_hex).collect(),
            path_indices: proof.path_bits().into_iter().map(u8::from).collect(),
        }
    }

    /// Reconstructs the path, checking the stored direction bits against the index.
    ///
    /// # Errors
    /// Malformed field elements or inconsistent indices.
    pub fn to_merkle_proof(&self) -> Result<MerkleProof> {
        let siblings = self
            .siblings
            .iter()
            .enumerate()
            .map(|(i, s)| parse_field(s).with_context(|| format!("Invalid sibling {}", i)))
            .collect::<Result<Vec<_>>>()?;
        let proof = MerkleProof {
            leaf: parse_field(&self.leaf).context("Invalid leaf")?,
            root: parse_field(&self.merkle_root).context("Invalid merkle root")?,
            siblings,
            index: self.leaf_index,
        };
        let bits: Vec<u8> = proof.path_bits().into_iter().map(u8::from).collect();
        if bits != self.path_indices {
            return Err(anyhow!("Path indices do not match leaf index {}", self.leaf_index));
        }
        Ok(proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::SCALAR_MODULUS;
    use crate::merkle::MerkleTree;
    use crate::nullifier::leaf_hash;

    fn now() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn sample_file() -> ProofFile {
        let recipient = Address::repeat_byte(0x42);
        let public = PublicInputs::new(Fr::from(10u64), &recipient, Fr::from(20u64));
        ProofFile {
            proof_system: ProofSystem::Groth16,
            proof: (1..=8).map(|i: u64| i.to_string()).collect(),
            public_signals: public.to_signals(),
            recipient: Some(format!("{recipient:?}")),
            timestamp: now(),
        }
    }

    #[test]
    fn test_public_inputs_from_words() {
        let words = [U256::from(1u64), U256::from(2u64), U256::from(3u64)];
        let inputs = PublicInputs::from_words(&words).unwrap();
        assert_eq!(inputs.to_array(), [Fr::from(1u64), Fr::from(2u64), Fr::from(3u64)]);
        assert_eq!(inputs.to_words(), words);
    }

    #[test]
    fn test_public_inputs_structural_checks() {
        assert_eq!(
            PublicInputs::from_words(&[U256::one(); 2]),
            Err(VerifyError::PublicInputCount {
                expected: 3,
                got: 2
            })
        );
        assert_eq!(
            PublicInputs::from_words(&[U256::one(), SCALAR_MODULUS, U256::one()]),
            Err(VerifyError::ScalarOutOfRange { what: "recipient" })
        );
        assert_eq!(
            PublicInputs::from_words(&[U256::one(), U256::one(), U256::zero()]),
            Err(VerifyError::ZeroNullifier)
        );
    }

    #[test]
    fn test_signals_are_decimal() {
        let inputs = PublicInputs {
            merkle_root: Fr::from(255u64),
            recipient: Fr::from(1u64),
            nullifier: Fr::from(2u64),
        };
        assert_eq!(inputs.to_signals(), vec!["255", "1", "2"]);
    }

    #[test]
    fn test_proof_file_validate_ok() {
        let file = sample_file();
        assert!(file.validate(&SecurityConfig::default()).is_ok());
        assert_eq!(file.proof_words().unwrap().len(), 8);
        assert_eq!(file.public_words().unwrap()[0], U256::from(10u64));
    }

    #[test]
    fn test_proof_file_timestamp_window() {
        let security = SecurityConfig::default();
        let mut file = sample_file();
        file.timestamp = now() + security.timestamp_tolerance_secs + 60;
        assert!(file
            .validate(&security)
            .unwrap_err()
            .to_string()
            .contains("future"));

        file.timestamp = now() - security.timestamp_max_age_secs - 60;
        assert!(file
            .validate(&security)
            .unwrap_err()
            .to_string()
            .contains("too old"));
    }

    #[test]
    fn test_proof_file_shape_checks() {
        let security = SecurityConfig::default();
        let mut file = sample_file();
        file.proof_system = ProofSystem::Plonk;
        assert!(file.validate(&security).is_err());

        let mut file = sample_file();
        file.public_signals.pop();
        assert!(file.validate(&security).is_err());
    }

    #[test]
    fn test_proof_file_recipient_mismatch() {
        let mut file = sample_file();
        file.recipient = Some(format!("{:?}", Address::repeat_byte(0x43)));
        assert!(file
            .validate(&SecurityConfig::default())
            .unwrap_err()
            .to_string()
            .contains("does not match"));
    }

    #[test]
    fn test_proof_file_json_round_trip() {
        let file = sample_file();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proof.json");
        file.save(&path).unwrap();

        let loaded = ProofFile::load(&path, 1024 * 1024).unwrap();
        assert_eq!(loaded.proof, file.proof);
        assert_eq!(loaded.proof_system, ProofSystem::Groth16);
        assert!(ProofFile::load(&path, 16).is_err());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"groth16\""));
    }

    #[test]
    fn test_merkle_path_output_round_trip() {
        let recipient = Address::repeat_byte(0x07);
        let leaves = vec![
            leaf_hash(Fr::from(1u64)).unwrap(),
            leaf_hash(address_to_field(&recipient)).unwrap(),
            leaf_hash(Fr::from(3u64)).unwrap(),
        ];
        let tree = MerkleTree::with_depth(leaves, 4).unwrap();
        let proof = tree.generate_proof(1).unwrap();

        let output = MerklePathOutput::new(&proof, &recipient);
        assert_eq!(output.path_indices, vec![1, 0, 0, 0]);
        let json = serde_json::to_string(&output).unwrap();
        let parsed: MerklePathOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.to_merkle_proof().unwrap(), proof);

        let mut bad = parsed;
        bad.path_indices[0] = 0;
        assert!(bad.to_merkle_proof().is_err());
    }
}
