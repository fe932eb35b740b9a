//! The membership relation as an R1CS constraint system.
//!
//! Public inputs, in allocation order: `merkle_root`, `recipient`, `nullifier`.
//! Private witness: the secret, one sibling per level and one direction bit per
//! level. The circuit enforces
//!
//! ```text
//! node_0      = Poseidon(recipient, 0, 0)
//! node_{i+1}  = bit_i ? Poseidon(sibling_i, node_i, 0) : Poseidon(node_i, sibling_i, 0)
//! node_depth  == merkle_root
//! nullifier   == Poseidon(secret, NULLIFIER_SALT, 0)
//! ```
//!
//! The secret appears only in the last constraint. Production circuits use
//! depth 26; fixtures may use smaller depths, which yield a different
//! verification key.

use crate::merkle::{hash_node, MerkleProof};
use crate::nullifier::{leaf_hash, Secret};
use crate::poseidon::{poseidon3_gadget, MissingParameters};
use crate::types::PublicInputs;
use crate::{NULLIFIER_SALT, TREE_DEPTH};
use anyhow::{anyhow, Result};
use ark_bn254::Fr;
use ark_ff::Zero;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::select::CondSelectGadget;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

/// Private inputs to the membership relation.
#[derive(Debug, Clone)]
pub struct MembershipWitness {
    secret: Secret,
    recipient: Fr,
    siblings: Vec<Fr>,
    path_bits: Vec<bool>,
}

impl MembershipWitness {
    /// # Errors
    /// Returns an error if siblings and path bits differ in length or exceed
    /// the production depth.
    pub fn new(
        secret: Secret,
        recipient: Fr,
        siblings: Vec<Fr>,
        path_bits: Vec<bool>,
    ) -> Result<Self> {
        if siblings.len() != path_bits.len() {
            return Err(anyhow!(
                "Path has {} siblings but {} direction bits",
                siblings.len(),
                path_bits.len()
            ));
        }
        if siblings.len() > TREE_DEPTH {
            return Err(anyhow!(
                "Path depth {} exceeds maximum {}",
                siblings.len(),
                TREE_DEPTH
            ));
        }
        Ok(Self {
            secret,
            recipient,
            siblings,
            path_bits,
        })
    }

    /// Builds a witness from a tree path, checking that the path's leaf is the
    /// recipient's leaf.
    ///
    /// # Errors
    /// Returns an error if the path belongs to a different recipient.
    pub fn from_merkle_proof(secret: Secret, recipient: Fr, proof: &MerkleProof) -> Result<Self> {
        if proof.leaf != leaf_hash(recipient)? {
            return Err(anyhow!("Merkle path leaf does not match the recipient"));
        }
        Self::new(secret, recipient, proof.siblings.clone(), proof.path_bits())
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    #[must_use]
    pub fn siblings(&self) -> &[Fr] {
        &self.siblings
    }

    /// Replaces one sibling, returning the previous value.
    pub fn replace_sibling(&mut self, level: usize, value: Fr) -> Option<Fr> {
        self.siblings
            .get_mut(level)
            .map(|slot| std::mem::replace(slot, value))
    }

    /// The public inputs this witness proves.
    ///
    /// # Errors
    /// [`MissingParameters`] if the hash tables are unavailable.
    pub fn public_inputs(&self) -> Result<PublicInputs, MissingParameters> {
        let root = self
            .siblings
            .iter()
            .zip(self.path_bits.iter())
            .try_fold(leaf_hash(self.recipient)?, |node, (sibling, &is_right)| {
                hash_node(&node, sibling, is_right)
            })?;
        Ok(PublicInputs {
            merkle_root: root,
            recipient: self.recipient,
            nullifier: self.secret.nullifier()?,
        })
    }

    /// Evaluates the relation natively.
    #[must_use]
    pub fn is_satisfied(&self, public: &PublicInputs) -> bool {
        self.public_inputs()
            .map_or(false, |computed| computed == *public)
    }
}

/// Circuit instance: a witness paired with the public inputs it claims.
#[derive(Debug, Clone)]
pub struct MembershipCircuit {
    pub public: PublicInputs,
    pub witness: MembershipWitness,
}

impl MembershipCircuit {
    /// Circuit whose public inputs are the ones the witness actually proves.
    ///
    /// # Errors
    /// [`MissingParameters`] if the hash tables are unavailable.
    pub fn new(witness: MembershipWitness) -> Result<Self, MissingParameters> {
        Ok(Self {
            public: witness.public_inputs()?,
            witness,
        })
    }

    /// Circuit claiming arbitrary public inputs; unsatisfiable unless they match.
    #[must_use]
    pub fn with_public_inputs(witness: MembershipWitness, public: PublicInputs) -> Self {
        Self { public, witness }
    }
}

impl ConstraintSynthesizer<Fr> for MembershipCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let witness = self.witness;
        if witness.siblings.len() != witness.path_bits.len() {
            return Err(SynthesisError::Unsatisfiable);
        }

        let root = FpVar::new_input(cs.clone(), || Ok(self.public.merkle_root))?;
        let recipient = FpVar::new_input(cs.clone(), || Ok(self.public.recipient))?;
        let nullifier = FpVar::new_input(cs.clone(), || Ok(self.public.nullifier))?;
        let secret = FpVar::new_witness(cs.clone(), || Ok(witness.secret.as_field()))?;

        let zero = FpVar::Constant(Fr::zero());
        let mut node = poseidon3_gadget(&recipient, &zero, &zero)?;

        for (sibling, is_right) in witness.siblings.iter().zip(witness.path_bits.iter()) {
            let sibling = FpVar::new_witness(cs.clone(), || Ok(*sibling))?;
            let is_right = Boolean::new_witness(cs.clone(), || Ok(*is_right))?;

            let left = FpVar::conditionally_select(&is_right, &sibling, &node)?;
            let right = FpVar::conditionally_select(&is_right, &node, &sibling)?;
            node = poseidon3_gadget(&left, &right, &zero)?;
        }
        node.enforce_equal(&root)?;

        let salt = FpVar::Constant(Fr::from(NULLIFIER_SALT));
        poseidon3_gadget(&secret, &salt, &zero)?.enforce_equal(&nullifier)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MerkleTree;
    use ark_relations::r1cs::ConstraintSystem;

    fn witness_at(index: usize) -> MembershipWitness {
        let recipients: Vec<Fr> = (100..106u64).map(Fr::from).collect();
        let leaves = recipients.iter().map(|r| leaf_hash(*r).unwrap()).collect();
        let tree = MerkleTree::with_depth(leaves, 3).unwrap();
        let proof = tree.generate_proof(index).unwrap();
        MembershipWitness::from_merkle_proof(
            Secret::from_field(Fr::from(777u64)),
            recipients[index],
            &proof,
        )
        .unwrap()
    }

    fn satisfied(circuit: MembershipCircuit) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn test_honest_witness_satisfies_every_position() {
        for index in 0..6 {
            let witness = witness_at(index);
            let public = witness.public_inputs().unwrap();
            assert!(witness.is_satisfied(&public));
            assert!(satisfied(MembershipCircuit::new(witness).unwrap()), "index {index}");
        }
    }

    #[test]
    fn test_public_input_layout() {
        let witness = witness_at(1);
        let public = witness.public_inputs().unwrap();
        let cs = ConstraintSystem::<Fr>::new_ref();
        MembershipCircuit::new(witness).unwrap().generate_constraints(cs.clone()).unwrap();
        // Slot 0 is the constant one.
        assert_eq!(cs.num_instance_variables(), 4);
        let borrowed = cs.borrow().unwrap();
        assert_eq!(borrowed.instance_assignment[1..], public.to_array());
    }

    #[test]
    fn test_wrong_public_inputs_unsatisfied() {
        let witness = witness_at(2);
        let honest = witness.public_inputs().unwrap();

        let mut wrong_root = honest;
        wrong_root.merkle_root += Fr::from(1u64);
        let mut wrong_recipient = honest;
        wrong_recipient.recipient = Fr::from(999u64);
        let mut wrong_nullifier = honest;
        wrong_nullifier.nullifier = Fr::from(777u64);

        for public in [wrong_root, wrong_recipient, wrong_nullifier] {
            assert!(!witness.is_satisfied(&public));
            assert!(!satisfied(MembershipCircuit::with_public_inputs(
                witness.clone(),
                public
            )));
        }
    }

    #[test]
    fn test_tampered_sibling_unsatisfied() {
        let honest = witness_at(3);
        let public = honest.public_inputs().unwrap();
        let mut tampered = honest;
        tampered.replace_sibling(1, Fr::from(5u64)).unwrap();
        assert!(!satisfied(MembershipCircuit::with_public_inputs(
            tampered, public
        )));
    }

    #[test]
    fn test_witness_validation() {
        let secret = Secret::from_field(Fr::from(1u64));
        assert!(MembershipWitness::new(secret.clone(), Fr::zero(), vec![Fr::zero()], vec![]).is_err());
        assert!(MembershipWitness::new(
            secret.clone(),
            Fr::zero(),
            vec![Fr::zero(); TREE_DEPTH + 1],
            vec![false; TREE_DEPTH + 1]
        )
        .is_err());

        let tree = MerkleTree::with_depth(vec![leaf_hash(Fr::from(1u64)).unwrap()], 2).unwrap();
        let proof = tree.generate_proof(0).unwrap();
        assert!(MembershipWitness::from_merkle_proof(secret, Fr::from(2u64), &proof).is_err());
    }
}
