//! PLONK verifier for snarkjs proofs over BN254.
//!
//! Follows the snarkjs 0.7 Solidity verifier step for step: the transcript
//! layout, the Lagrange/vanishing evaluations, the linearisation commitment and
//! the final KZG batch opening all match so that proofs produced by `snarkjs
//! plonk prove` verify here unchanged.

use crate::error::VerifyError;
use crate::field::{
    batch_inverse, check_not_degenerate, fr_from_word, fr_to_word, g1_from_words, g1_to_words,
};
use crate::transcript::Transcript;
use crate::types::PublicInputs;
use ark_bn254::{Bn254, Fr, G1Affine, G1Projective, G2Affine};
use ark_ec::pairing::Pairing;
use ark_ec::{AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::{Field, One, Zero};
use ethers::types::U256;

/// Number of words in a serialised proof: nine points and six evaluations.
pub const PROOF_WORDS: usize = 24;

/// Largest domain exponent the BN254 scalar field supports.
pub const MAX_POWER: u32 = 28;

/// Circuit-specific constants of a PLONK verification key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlonkVerificationKey {
    /// Domain size is `2^power`.
    pub power: u32,
    pub n_public: usize,
    pub k1: Fr,
    pub k2: Fr,
    pub qm: G1Affine,
    pub ql: G1Affine,
    pub qr: G1Affine,
    pub qo: G1Affine,
    pub qc: G1Affine,
    pub s1: G1Affine,
    pub s2: G1Affine,
    pub s3: G1Affine,
    /// `[x]_2` from the SRS.
    pub x2: G2Affine,
    /// Generator of the evaluation domain.
    pub omega: Fr,
}

impl PlonkVerificationKey {
    #[must_use]
    pub fn domain_size(&self) -> u64 {
        1u64 << self.power
    }

    /// Checks the key's internal consistency.
    ///
    /// # Errors
    /// Returns a message describing the first inconsistency found.
    pub fn validate(&self) -> Result<(), String> {
        if self.power == 0 || self.power > MAX_POWER {
            return Err(format!("power {} outside 1..={}", self.power, MAX_POWER));
        }
        if self.n_public != PublicInputs::COUNT {
            return Err(format!(
                "key declares {} public inputs, relation has {}",
                self.n_public,
                PublicInputs::COUNT
            ));
        }
        if self.omega.pow([self.domain_size()]) != Fr::one() {
            return Err("omega is not a root of unity of the domain size".to_string());
        }
        if self.omega.pow([self.domain_size() / 2]) == Fr::one() {
            return Err("omega is not a primitive root of unity".to_string());
        }
        Ok(())
    }
}

/// A decoded snarkjs PLONK proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlonkProof {
    pub a: G1Affine,
    pub b: G1Affine,
    pub c: G1Affine,
    pub z: G1Affine,
    pub t1: G1Affine,
    pub t2: G1Affine,
    pub t3: G1Affine,
    pub wxi: G1Affine,
    pub wxiw: G1Affine,
    pub eval_a: Fr,
    pub eval_b: Fr,
    pub eval_c: Fr,
    pub eval_s1: Fr,
    pub eval_s2: Fr,
    pub eval_zw: Fr,
}

const POINT_NAMES: [&str; 9] = ["A", "B", "C", "Z", "T1", "T2", "T3", "Wxi", "Wxiw"];
const EVAL_NAMES: [&str; 6] = ["eval_a", "eval_b", "eval_c", "eval_s1", "eval_s2", "eval_zw"];

impl PlonkProof {
    /// Decodes the 24-word snarkjs layout.
    ///
    /// Evaluations are range-checked before any point is decoded.
    ///
    /// # Errors
    /// Any structural or degenerate-input rejection.
    pub fn from_words(words: &[U256]) -> Result<Self, VerifyError> {
        if words.len() != PROOF_WORDS {
            return Err(VerifyError::ProofLength {
                expected: PROOF_WORDS,
                got: words.len(),
            });
        }
        check_not_degenerate(words)?;

        let mut evals = [Fr::zero(); 6];
        for (i, eval) in evals.iter_mut().enumerate() {
            *eval = fr_from_word(words[18 + i], EVAL_NAMES[i])?;
        }

        let mut points = [G1Affine::identity(); 9];
        for (i, point) in points.iter_mut().enumerate() {
            *point = g1_from_words(words[2 * i], words[2 * i + 1], POINT_NAMES[i])?;
        }

        let [a, b, c, z, t1, t2, t3, wxi, wxiw] = points;
        let [eval_a, eval_b, eval_c, eval_s1, eval_s2, eval_zw] = evals;
        Ok(Self {
            a,
            b,
            c,
            z,
            t1,
            t2,
            t3,
            wxi,
            wxiw,
            eval_a,
            eval_b,
            eval_c,
            eval_s1,
            eval_s2,
            eval_zw,
        })
    }

    #[must_use]
    pub fn to_words(&self) -> Vec<U256> {
        let points = [
            &self.a, &self.b, &self.c, &self.z, &self.t1, &self.t2, &self.t3, &self.wxi,
            &self.wxiw,
        ];
        let evals = [
            &self.eval_a,
            &self.eval_b,
            &self.eval_c,
            &self.eval_s1,
            &self.eval_s2,
            &self.eval_zw,
        ];
        let mut words: Vec<U256> = points.iter().flat_map(|p| g1_to_words(p)).collect();
        words.extend(evals.iter().map(|e| fr_to_word(e)));
        words
    }
}

/// Fiat-Shamir challenges, in derivation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Challenges {
    pub beta: Fr,
    pub gamma: Fr,
    pub alpha: Fr,
    pub xi: Fr,
    /// `v1..v5`
    pub v: [Fr; 5],
    pub u: Fr,
}

/// Domain values at `xi`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DomainEvaluation {
    pub xin: Fr,
    pub zh: Fr,
    /// `L1..L3`
    pub lagrange: [Fr; 3],
}

impl PlonkVerificationKey {
    pub(crate) fn challenges(&self, proof: &PlonkProof, public: &PublicInputs) -> Challenges {
        let mut transcript = Transcript::new();

        for point in [
            &self.qm, &self.ql, &self.qr, &self.qo, &self.qc, &self.s1, &self.s2, &self.s3,
        ] {
            transcript.append_point(point);
        }
        for input in public.to_array() {
            transcript.append_scalar(&input);
        }
        transcript.append_point(&proof.a);
        transcript.append_point(&proof.b);
        transcript.append_point(&proof.c);
        let beta = transcript.challenge();

        transcript.append_scalar(&beta);
        let gamma = transcript.challenge();

        transcript.append_scalar(&beta);
        transcript.append_scalar(&gamma);
        transcript.append_point(&proof.z);
        let alpha = transcript.challenge();

        transcript.append_scalar(&alpha);
        transcript.append_point(&proof.t1);
        transcript.append_point(&proof.t2);
        transcript.append_point(&proof.t3);
        let xi = transcript.challenge();

        transcript.append_scalar(&xi);
        for eval in [
            &proof.eval_a,
            &proof.eval_b,
            &proof.eval_c,
            &proof.eval_s1,
            &proof.eval_s2,
            &proof.eval_zw,
        ] {
            transcript.append_scalar(eval);
        }
        let v1 = transcript.challenge();
        let v2 = v1 * v1;
        let v3 = v2 * v1;
        let v4 = v3 * v1;
        let v5 = v4 * v1;

        transcript.append_point(&proof.wxi);
        transcript.append_point(&proof.wxiw);
        let u = transcript.challenge();

        Challenges {
            beta,
            gamma,
            alpha,
            xi,
            v: [v1, v2, v3, v4, v5],
            u,
        }
    }

    /// `xi^n`, `Z_H(xi)` and the Lagrange basis for the public-input rows.
    pub(crate) fn evaluate_domain(&self, xi: Fr) -> Result<DomainEvaluation, VerifyError> {
        let mut xin = xi;
        for _ in 0..self.power {
            xin.square_in_place();
        }
        let zh = xin - Fr::one();

        let n = Fr::from(self.domain_size());
        let mut w = Fr::one();
        let mut roots = [Fr::zero(); 3];
        // Denominators n(xi - w^i) for the three public rows, then Z_H itself
        // so a challenge inside the domain is caught by the same inversion.
        let mut inverses = [Fr::zero(); 4];
        for i in 0..3 {
            roots[i] = w;
            inverses[i] = n * (xi - w);
            w *= self.omega;
        }
        inverses[3] = zh;
        batch_inverse(&mut inverses).ok_or(VerifyError::DegenerateChallenge)?;

        let mut lagrange = [Fr::zero(); 3];
        for i in 0..3 {
            lagrange[i] = roots[i] * zh * inverses[i];
        }

        Ok(DomainEvaluation { xin, zh, lagrange })
    }

    /// `F - E`: the batched opening commitment minus the commitment to its
    /// claimed value, computed as a single multi-scalar multiplication.
    pub(crate) fn opening_commitment(
        &self,
        proof: &PlonkProof,
        public: &PublicInputs,
        ch: &Challenges,
        domain: &DomainEvaluation,
    ) -> Result<G1Projective, VerifyError> {
        let [l1, l2, l3] = domain.lagrange;
        let [pub0, pub1, pub2] = public.to_array();
        let pi = -(l1 * pub0 + l2 * pub1 + l3 * pub2);

        let alpha2 = ch.alpha * ch.alpha;
        let l1_alpha2 = l1 * alpha2;

        let wire_a = proof.eval_a + ch.beta * proof.eval_s1 + ch.gamma;
        let wire_b = proof.eval_b + ch.beta * proof.eval_s2 + ch.gamma;
        let wire_c = proof.eval_c + ch.gamma;
        let r0 = pi - l1_alpha2 - wire_a * wire_b * wire_c * proof.eval_zw * ch.alpha;

        let beta_xi = ch.beta * ch.xi;
        let d2a = (proof.eval_a + beta_xi + ch.gamma)
            * (proof.eval_b + beta_xi * self.k1 + ch.gamma)
            * (proof.eval_c + beta_xi * self.k2 + ch.gamma)
            * ch.alpha;
        let d3 = wire_a * wire_b * ch.alpha * ch.beta * proof.eval_zw;

        let [v1, v2, v3, v4, v5] = ch.v;
        let e = -r0
            + v1 * proof.eval_a
            + v2 * proof.eval_b
            + v3 * proof.eval_c
            + v4 * proof.eval_s1
            + v5 * proof.eval_s2
            + ch.u * proof.eval_zw;

        let bases = [
            self.qm,
            self.ql,
            self.qr,
            self.qo,
            self.qc,
            proof.z,
            self.s3,
            proof.t1,
            proof.t2,
            proof.t3,
            proof.a,
            proof.b,
            proof.c,
            self.s1,
            self.s2,
            G1Affine::generator(),
        ];
        let scalars = [
            proof.eval_a * proof.eval_b,
            proof.eval_a,
            proof.eval_b,
            proof.eval_c,
            Fr::one(),
            d2a + l1_alpha2 + ch.u,
            -d3,
            -domain.zh,
            -domain.zh * domain.xin,
            -domain.zh * domain.xin * domain.xin,
            v1,
            v2,
            v3,
            v4,
            v5,
            -e,
        ];

        G1Projective::msm(&bases, &scalars).map_err(|_| VerifyError::Msm)
    }

    fn pairing_check(
        &self,
        proof: &PlonkProof,
        ch: &Challenges,
        f_minus_e: G1Projective,
    ) -> Result<(), VerifyError> {
        let a1 = proof.wxi.into_group() + proof.wxiw * ch.u;
        let b1 = proof.wxi * ch.xi + proof.wxiw * (ch.u * ch.xi * self.omega) + f_minus_e;

        let lhs = (-a1).into_affine();
        let rhs = b1.into_affine();
        let result = Bn254::multi_pairing([lhs, rhs], [self.x2, G2Affine::generator()]);
        if result.0.is_one() {
            Ok(())
        } else {
            Err(VerifyError::PairingMismatch)
        }
    }

    /// Verifies a decoded proof against the three public inputs.
    ///
    /// # Errors
    /// [`VerifyError::DegenerateChallenge`] if `xi` lands in the domain,
    /// [`VerifyError::PairingMismatch`] if the proof is invalid.
    pub fn verify_proof(&self, proof: &PlonkProof, public: &PublicInputs) -> Result<(), VerifyError> {
        public.check()?;
        let challenges = self.challenges(proof, public);
        let domain = self.evaluate_domain(challenges.xi)?;
        let f_minus_e = self.opening_commitment(proof, public, &challenges, &domain)?;
        self.pairing_check(proof, &challenges, f_minus_e)
    }
}
