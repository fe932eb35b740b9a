//! snarkjs `verification_key.json` loading and export.
//!
//! Coordinates are decimal strings in projective form. G1 points are
//! `[x, y, z]`, G2 points `[[x.c0, x.c1], [y.c0, y.c1], [z.c0, z.c1]]`.
//! Only affine (`z = 1`) points and the point at infinity (`z = 0`) are
//! accepted.

use crate::field::{fq_to_word, fr_from_word, fr_to_word, g1_from_words, g2_from_words};
use crate::groth16::Groth16VerificationKey;
use crate::plonk::PlonkVerificationKey;
use crate::types::PublicInputs;
use crate::utils::parse_word;
use crate::verifier::ProofSystem;
use anyhow::{anyhow, Context, Result};
use ark_bn254::{Fr, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ethers::types::U256;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

const CURVE: &str = "bn128";

type G1Json = [String; 3];
type G2Json = [[String; 2]; 3];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlonkKeyJson {
    pub curve: String,
    #[serde(rename = "nPublic")]
    pub n_public: usize,
    pub power: u32,
    pub k1: String,
    pub k2: String,
    #[serde(rename = "Qm")]
    pub qm: G1Json,
    #[serde(rename = "Ql")]
    pub ql: G1Json,
    #[serde(rename = "Qr")]
    pub qr: G1Json,
    #[serde(rename = "Qo")]
    pub qo: G1Json,
    #[serde(rename = "Qc")]
    pub qc: G1Json,
    #[serde(rename = "S1")]
    pub s1: G1Json,
    #[serde(rename = "S2")]
    pub s2: G1Json,
    #[serde(rename = "S3")]
    pub s3: G1Json,
    #[serde(rename = "X_2")]
    pub x2: G2Json,
    pub w: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groth16KeyJson {
    pub curve: String,
    #[serde(rename = "nPublic")]
    pub n_public: usize,
    pub vk_alpha_1: G1Json,
    pub vk_beta_2: G2Json,
    pub vk_gamma_2: G2Json,
    pub vk_delta_2: G2Json,
    #[serde(rename = "IC")]
    pub ic: Vec<G1Json>,
}

/// The file as snarkjs writes it, dispatched on its `protocol` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum VerificationKeyJson {
    Plonk(PlonkKeyJson),
    Groth16(Groth16KeyJson),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationKey {
    Plonk(PlonkVerificationKey),
    Groth16(Groth16VerificationKey),
}

fn decimal(word: U256) -> String {
    word.to_string()
}

fn parse_coordinate(value: &str, what: &str) -> Result<U256> {
    parse_word(value).with_context(|| format!("Invalid coordinate in {}", what))
}

fn parse_g1(json: &G1Json, what: &'static str) -> Result<G1Affine> {
    let z = parse_coordinate(&json[2], what)?;
    if z.is_zero() {
        return Ok(G1Affine::identity());
    }
    if z != U256::one() {
        return Err(anyhow!("{} must be affine (z = 1)", what));
    }
    let x = parse_coordinate(&json[0], what)?;
    let y = parse_coordinate(&json[1], what)?;
    g1_from_words(x, y, what).with_context(|| format!("Invalid point {}", what))
}

fn g1_json(point: &G1Affine) -> G1Json {
    match point.xy() {
        None => ["0".to_string(), "1".to_string(), "0".to_string()],
        Some((x, y)) => [
            decimal(fq_to_word(x)),
            decimal(fq_to_word(y)),
            "1".to_string(),
        ],
    }
}

fn parse_g2(json: &G2Json, what: &'static str) -> Result<G2Affine> {
    let z0 = parse_coordinate(&json[2][0], what)?;
    let z1 = parse_coordinate(&json[2][1], what)?;
    if z0.is_zero() && z1.is_zero() {
        return Ok(G2Affine::identity());
    }
    if z0 != U256::one() || !z1.is_zero() {
        return Err(anyhow!("{} must be affine (z = [1, 0])", what));
    }
    let x_c0 = parse_coordinate(&json[0][0], what)?;
    let x_c1 = parse_coordinate(&json[0][1], what)?;
    let y_c0 = parse_coordinate(&json[1][0], what)?;
    let y_c1 = parse_coordinate(&json[1][1], what)?;
    g2_from_words(x_c1, x_c0, y_c1, y_c0, what).with_context(|| format!("Invalid point {}", what))
}

fn g2_json(point: &G2Affine) -> G2Json {
    let zero = || "0".to_string();
    match point.xy() {
        None => [
            [zero(), zero()],
            ["1".to_string(), zero()],
            [zero(), zero()],
        ],
        Some((x, y)) => [
            [decimal(fq_to_word(&x.c0)), decimal(fq_to_word(&x.c1))],
            [decimal(fq_to_word(&y.c0)), decimal(fq_to_word(&y.c1))],
            ["1".to_string(), zero()],
        ],
    }
}

fn parse_scalar(value: &str, what: &'static str) -> Result<Fr> {
    let word = parse_coordinate(value, what)?;
    fr_from_word(word, what).with_context(|| format!("Invalid scalar {}", what))
}

fn check_header(curve: &str, n_public: usize) -> Result<()> {
    if curve != CURVE {
        return Err(anyhow!("Unsupported curve '{}', expected {}", curve, CURVE));
    }
    if n_public != PublicInputs::COUNT {
        return Err(anyhow!(
            "Key declares {} public inputs, expected {}",
            n_public,
            PublicInputs::COUNT
        ));
    }
    Ok(())
}

impl PlonkKeyJson {
    /// # Errors
    /// Any malformed coordinate, unexpected header, or invalid domain.
    pub fn to_key(&self) -> Result<PlonkVerificationKey> {
        check_header(&self.curve, self.n_public)?;
        let key = PlonkVerificationKey {
            power: self.power,
            n_public: self.n_public,
            k1: parse_scalar(&self.k1, "k1")?,
            k2: parse_scalar(&self.k2, "k2")?,
            qm: parse_g1(&self.qm, "Qm")?,
            ql: parse_g1(&self.ql, "Ql")?,
            qr: parse_g1(&self.qr, "Qr")?,
            qo: parse_g1(&self.qo, "Qo")?,
            qc: parse_g1(&self.qc, "Qc")?,
            s1: parse_g1(&self.s1, "S1")?,
            s2: parse_g1(&self.s2, "S2")?,
            s3: parse_g1(&self.s3, "S3")?,
            x2: parse_g2(&self.x2, "X_2")?,
            omega: parse_scalar(&self.w, "w")?,
        };
        key.validate().map_err(|e| anyhow!("Invalid PLONK key: {}", e))?;
        Ok(key)
    }

    #[must_use]
    pub fn from_key(key: &PlonkVerificationKey) -> Self {
        Self {
            curve: CURVE.to_string(),
            n_public: key.n_public,
            power: key.power,
            k1: decimal(fr_to_word(&key.k1)),
            k2: decimal(fr_to_word(&key.k2)),
            qm: g1_json(&key.qm),
            ql: g1_json(&key.ql),
            qr: g1_json(&key.qr),
            qo: g1_json(&key.qo),
            qc: g1_json(&key.qc),
            s1: g1_json(&key.s1),
            s2: g1_json(&key.s2),
            s3: g1_json(&key.s3),
            x2: g2_json(&key.x2),
            w: decimal(fr_to_word(&key.omega)),
        }
    }
}

impl Groth16KeyJson {
    /// # Errors
    /// Any malformed coordinate, unexpected header, or wrong IC count.
    pub fn to_key(&self) -> Result<Groth16VerificationKey> {
        check_header(&self.curve, self.n_public)?;
        let ic = self
            .ic
            .iter()
            .map(|point| parse_g1(point, "IC"))
            .collect::<Result<Vec<_>>>()?;
        let key = Groth16VerificationKey {
            alpha_g1: parse_g1(&self.vk_alpha_1, "vk_alpha_1")?,
            beta_g2: parse_g2(&self.vk_beta_2, "vk_beta_2")?,
            gamma_g2: parse_g2(&self.vk_gamma_2, "vk_gamma_2")?,
            delta_g2: parse_g2(&self.vk_delta_2, "vk_delta_2")?,
            ic,
        };
        key.validate().map_err(|e| anyhow!("Invalid Groth16 key: {}", e))?;
        Ok(key)
    }

    #[must_use]
    pub fn from_key(key: &Groth16VerificationKey) -> Self {
        Self {
            curve: CURVE.to_string(),
            n_public: key.ic.len().saturating_sub(1),
            vk_alpha_1: g1_json(&key.alpha_g1),
            vk_beta_2: g2_json(&key.beta_g2),
            vk_gamma_2: g2_json(&key.gamma_g2),
            vk_delta_2: g2_json(&key.delta_g2),
            ic: key.ic.iter().map(g1_json).collect(),
        }
    }
}

impl VerificationKey {
    #[must_use]
    pub fn proof_system(&self) -> ProofSystem {
        match self {
            Self::Plonk(_) => ProofSystem::Plonk,
            Self::Groth16(_) => ProofSystem::Groth16,
        }
    }

    /// # Errors
    /// Returns an error for invalid JSON or an invalid key.
    pub fn from_json(content: &str) -> Result<Self> {
        let json: VerificationKeyJson =
            serde_json::from_str(content).context("Failed to parse verification key JSON")?;
        match json {
            VerificationKeyJson::Plonk(inner) => inner.to_key().map(Self::Plonk),
            VerificationKeyJson::Groth16(inner) => inner.to_key().map(Self::Groth16),
        }
    }

    /// # Errors
    /// Returns an error if serialisation fails.
    pub fn to_json(&self) -> Result<String> {
        let json = match self {
            Self::Plonk(key) => VerificationKeyJson::Plonk(PlonkKeyJson::from_key(key)),
            Self::Groth16(key) => VerificationKeyJson::Groth16(Groth16KeyJson::from_key(key)),
        };
        serde_json::to_string_pretty(&json).context("Failed to serialize verification key")
    }

    /// Reads a key file, refusing anything larger than `max_file_size`.
    ///
    /// # Errors
    /// I/O, size, JSON or key validation errors.
    pub fn load(path: &Path, max_file_size: u64) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to read verification key: {}", path.display()))?;
        if metadata.len() > max_file_size {
            return Err(anyhow!(
                "Verification key too large: {} bytes (max {})",
                metadata.len(),
                max_file_size
            ));
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read verification key: {}", path.display()))?;
        let key = Self::from_json(&content)
            .with_context(|| format!("Invalid verification key: {}", path.display()))?;
        debug!(
            "Loaded {} verification key from {}",
            key.proof_system(),
            path.display()
        );
        Ok(key)
    }

    /// # Errors
    /// I/O or serialisation errors.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write verification key: {}", path.display()))
    }
}
