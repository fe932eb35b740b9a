//! Groth16 verifier over BN254 with EIP-197 proof encoding.

use crate::error::VerifyError;
use crate::field::{check_not_degenerate, g1_from_words, g1_to_words, g2_from_words, g2_to_words};
use crate::types::PublicInputs;
use ark_bn254::{Bn254, G1Affine, G1Projective, G2Affine};
use ark_ec::pairing::Pairing;
use ark_ec::{AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::One;
use ethers::types::U256;

/// `A.x A.y B.x.c1 B.x.c0 B.y.c1 B.y.c0 C.x C.y`
pub const PROOF_WORDS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Groth16VerificationKey {
    pub alpha_g1: G1Affine,
    pub beta_g2: G2Affine,
    pub gamma_g2: G2Affine,
    pub delta_g2: G2Affine,
    /// One point per public input, plus the constant term first.
    pub ic: Vec<G1Affine>,
}

impl Groth16VerificationKey {
    /// # Errors
    /// Returns a message if the key does not carry one IC point per public input plus one.
    pub fn validate(&self) -> Result<(), String> {
        if self.ic.len() != PublicInputs::COUNT + 1 {
            return Err(format!(
                "key carries {} IC points, expected {}",
                self.ic.len(),
                PublicInputs::COUNT + 1
            ));
        }
        Ok(())
    }

    /// `IC[0] + sum(input_i * IC[i + 1])`
    fn accumulate_inputs(&self, public: &PublicInputs) -> Result<G1Projective, VerifyError> {
        let inputs = public.to_array();
        let Some((constant, bases)) = self.ic.split_first() else {
            return Err(VerifyError::PublicInputCount {
                expected: 0,
                got: inputs.len(),
            });
        };
        if bases.len() != inputs.len() {
            return Err(VerifyError::PublicInputCount {
                expected: bases.len(),
                got: inputs.len(),
            });
        }
        let weighted = G1Projective::msm(bases, &inputs).map_err(|_| VerifyError::Msm)?;
        Ok(weighted + constant)
    }

    /// Checks `e(A, B) = e(alpha, beta) * e(vk_x, gamma) * e(C, delta)` as one
    /// four-term pairing product.
    ///
    /// # Errors
    /// [`VerifyError::PairingMismatch`] for an invalid proof.
    pub fn verify_proof(
        &self,
        proof: &Groth16Proof,
        public: &PublicInputs,
    ) -> Result<(), VerifyError> {
        public.check()?;
        let vk_x = self.accumulate_inputs(public)?.into_affine();
        let neg_a = (-proof.a.into_group()).into_affine();

        let result = Bn254::multi_pairing(
            [neg_a, self.alpha_g1, vk_x, proof.c],
            [proof.b, self.beta_g2, self.gamma_g2, self.delta_g2],
        );
        if result.0.is_one() {
            Ok(())
        } else {
            Err(VerifyError::PairingMismatch)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Groth16Proof {
    pub a: G1Affine,
    pub b: G2Affine,
    pub c: G1Affine,
}

impl Groth16Proof {
    /// # Errors
    /// Wrong length, degenerate words, or a point that fails decoding.
    pub fn from_words(words: &[U256]) -> Result<Self, VerifyError> {
        if words.len() != PROOF_WORDS {
            return Err(VerifyError::ProofLength {
                expected: PROOF_WORDS,
                got: words.len(),
            });
        }
        check_not_degenerate(words)?;

        Ok(Self {
            a: g1_from_words(words[0], words[1], "A")?,
            b: g2_from_words(words[2], words[3], words[4], words[5], "B")?,
            c: g1_from_words(words[6], words[7], "C")?,
        })
    }

    #[must_use]
    pub fn to_words(&self) -> Vec<U256> {
        let mut words = Vec::with_capacity(PROOF_WORDS);
        words.extend(g1_to_words(&self.a));
        words.extend(g2_to_words(&self.b));
        words.extend(g1_to_words(&self.c));
        words
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::honest_proof;
    use super::*;
    use crate::field::BASE_MODULUS;
    use ark_bn254::Fr;

    #[test]
    fn test_honest_proof_verifies() {
        let (key, proof, public) = honest_proof(1);
        assert!(key.validate().is_ok());
        assert_eq!(key.verify_proof(&proof, &public), Ok(()));
        // Idempotent.
        assert_eq!(key.verify_proof(&proof, &public), Ok(()));
    }

    #[test]
    fn test_public_input_changes_rejected() {
        let (key, proof, public) = honest_proof(2);
        let mut wrong_root = public;
        wrong_root.merkle_root += Fr::one();
        let mut wrong_recipient = public;
        wrong_recipient.recipient += Fr::one();
        let mut wrong_nullifier = public;
        wrong_nullifier.nullifier += Fr::one();
        for wrong in [wrong_root, wrong_recipient, wrong_nullifier] {
            assert_eq!(
                key.verify_proof(&proof, &wrong),
                Err(VerifyError::PairingMismatch)
            );
        }
    }

    #[test]
    fn test_words_round_trip() {
        let (key, proof, public) = honest_proof(3);
        let words = proof.to_words();
        assert_eq!(words.len(), PROOF_WORDS);
        let decoded = Groth16Proof::from_words(&words).unwrap();
        assert_eq!(decoded, proof);
        assert!(key.verify_proof(&decoded, &public).is_ok());
    }

    #[test]
    fn test_swapped_g2_coefficients_rejected() {
        let (_, proof, _) = honest_proof(4);
        let mut words = proof.to_words();
        words.swap(2, 3);
        assert!(Groth16Proof::from_words(&words).is_err());
    }

    #[test]
    fn test_structural_rejections() {
        assert_eq!(
            Groth16Proof::from_words(&[U256::one(); 24]),
            Err(VerifyError::ProofLength {
                expected: 8,
                got: 24
            })
        );
        assert_eq!(
            Groth16Proof::from_words(&[U256::zero(); 8]),
            Err(VerifyError::DegenerateProof)
        );

        let (_, proof, _) = honest_proof(5);
        let mut words = proof.to_words();
        words[6] = BASE_MODULUS;
        assert_eq!(
            Groth16Proof::from_words(&words),
            Err(VerifyError::BaseFieldOutOfRange { what: "C" })
        );
    }

    #[test]
    fn test_wrong_ic_count() {
        let (mut key, proof, public) = honest_proof(6);
        key.ic.pop();
        assert!(key.validate().is_err());
        assert_eq!(
            key.verify_proof(&proof, &public),
            Err(VerifyError::PublicInputCount {
                expected: 2,
                got: 3
            })
        );
    }

    #[test]
    fn test_proof_for_other_key_rejected() {
        let (key, _, public) = honest_proof(7);
        let (_, other_proof, other_public) = honest_proof(8);
        // Independent setups for the same circuit shape.
        assert!(key.verify_proof(&other_proof, &other_public).is_err());
        assert!(key.verify_proof(&other_proof, &public).is_err());
    }
}
