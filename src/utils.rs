//! Utility functions for hex validation, word parsing and log formatting.

use crate::field::{fr_from_word, fr_to_be_bytes};
use anyhow::{anyhow, Result};
use ark_bn254::Fr;
use ethers::types::U256;

fn is_valid_hex_string(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_hexdigit())
}

fn strip_hex_prefix(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
}

/// Validates and strips hex prefix from a string.
///
/// # Errors
/// Returns an error if:
/// - The hex string has incorrect length
/// - The hex string contains non-hex characters
///
/// # Examples
///
/// ```
/// use zkp_airdrop_verifier::utils::validate_and_strip_hex;
///
/// let result = validate_and_strip_hex("0x1234abcd", 8).unwrap();
/// assert_eq!(result, "1234abcd");
/// ```
pub fn validate_and_strip_hex(input: &str, expected_len: usize) -> Result<String> {
    let stripped = strip_hex_prefix(input).unwrap_or_else(|| input.trim());

    if stripped.len() != expected_len {
        return Err(anyhow!(
            "Invalid hex string: must be {} characters (got {})",
            expected_len,
            stripped.len()
        ));
    }

    if !is_valid_hex_string(stripped) {
        return Err(anyhow!("Invalid hex string: contains non-hex characters"));
    }

    Ok(stripped.to_string())
}

/// Parses a 256-bit word written in decimal or `0x`-prefixed hex.
///
/// snarkjs emits decimal strings; Solidity calldata dumps use hex.
///
/// # Errors
/// Returns an error on empty input, invalid digits or overflow.
///
/// ```
/// use zkp_airdrop_verifier::utils::parse_word;
///
/// assert_eq!(parse_word("255").unwrap(), parse_word("0xff").unwrap());
/// ```
pub fn parse_word(input: &str) -> Result<U256> {
    let trimmed = input.trim();
    if let Some(hex_digits) = strip_hex_prefix(trimmed) {
        if hex_digits.is_empty() || hex_digits.len() > 64 || !is_valid_hex_string(hex_digits) {
            return Err(anyhow!("Invalid hex word '{}'", trimmed));
        }
        return U256::from_str_radix(hex_digits, 16)
            .map_err(|e| anyhow!("Invalid hex word '{}': {:?}", trimmed, e));
    }
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(anyhow!("Invalid decimal word '{}'", trimmed));
    }
    U256::from_dec_str(trimmed).map_err(|e| anyhow!("Invalid decimal word '{}': {:?}", trimmed, e))
}

/// Parses a list of words, naming the offending position on failure.
///
/// # Errors
/// Returns the first parse failure.
pub fn parse_words(inputs: &[String]) -> Result<Vec<U256>> {
    inputs
        .iter()
        .enumerate()
        .map(|(i, s)| parse_word(s).map_err(|e| anyhow!("Word {}: {}", i, e)))
        .collect()
}

/// Parses a canonical scalar field element.
///
/// # Errors
/// Returns an error if the word does not parse or is `>= Q`.
pub fn parse_field(input: &str) -> Result<Fr> {
    let word = parse_word(input)?;
    fr_from_word(word, "value").map_err(|e| anyhow!("{}", e))
}

/// `0x`-prefixed, zero-padded 64-digit hex of a field element.
#[must_use]
pub fn field_to_hex(value: &Fr) -> String {
    format!("0x{}", hex::encode(fr_to_be_bytes(value)))
}

/// Truncates an identifier (nullifier, root) before it reaches a log line.
#[must_use]
pub fn sanitize_for_log(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 16 {
        let head: String = chars[..10].iter().collect();
        let tail: String = chars[chars.len() - 6..].iter().collect();
        format!("{head}...{tail}")
    } else if chars.len() > 6 {
        format!("{}***", chars[..3].iter().collect::<String>())
    } else {
        "***".to_string()
    }
}
