//! Ethereum address validation and field encoding.
//!
//! A recipient address enters the relation as the field element whose
//! big-endian encoding is the address left-padded to 32 bytes.

use crate::utils::validate_and_strip_hex;
use anyhow::{anyhow, Context, Result};
use ark_bn254::Fr;
use ark_ff::PrimeField;
use ethers::types::Address;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Expected length of an Ethereum address in hex characters (excluding 0x prefix)
pub const ADDRESS_HEX_LENGTH: usize = 40;

/// Validates and normalizes a single Ethereum address.
///
/// Returns a lowercase hex string without the 0x prefix.
///
/// # Errors
///
/// Returns an error if:
/// - The address is not exactly 40 hex characters (excluding 0x prefix)
/// - The address contains non-hex characters
///
/// # Examples
///
/// ```
/// use zkp_airdrop_verifier::ethereum::normalize_address;
///
/// let normalized = normalize_address("0x742d35Cc6634C0532925a3b844Bc454e4438f44e").unwrap();
/// assert_eq!(normalized, "742d35cc6634c0532925a3b844bc454e4438f44e");
/// ```
pub fn normalize_address(address: &str) -> Result<String> {
    validate_and_strip_hex(address, ADDRESS_HEX_LENGTH).map(|s| s.to_lowercase())
}

/// Parses an address, rejecting the zero address.
///
/// # Errors
/// Returns an error for malformed hex or the zero address.
pub fn parse_address(address: &str) -> Result<Address> {
    let normalized = normalize_address(address)?;
    let bytes = hex::decode(&normalized).context("Failed to decode address from hex")?;
    let parsed = Address::from_slice(&bytes);
    if parsed.is_zero() {
        return Err(anyhow!("The zero address cannot be a recipient"));
    }
    Ok(parsed)
}

/// Reads one address per line. Blank lines and `#` comments are skipped.
///
/// # Errors
/// Returns an error if the file is missing, larger than `max_file_size`,
/// or contains an invalid address.
pub fn read_accounts_file(path: &Path, max_file_size: u64) -> Result<Vec<Address>> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read accounts file: {}", path.display()))?;
    if metadata.len() > max_file_size {
        return Err(anyhow!(
            "Accounts file too large: {} bytes (max {})",
            metadata.len(),
            max_file_size
        ));
    }

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open accounts file: {}", path.display()))?;
    let mut addresses = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", i + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let address = parse_address(trimmed)
            .with_context(|| format!("Invalid address at line {}: '{}'", i + 1, trimmed))?;
        addresses.push(address);
    }
    Ok(addresses)
}

/// The address left-padded to 32 bytes.
#[must_use]
pub fn address_to_bytes(address: &Address) -> [u8; 32] {
    let mut full = [0u8; 32];
    full[12..].copy_from_slice(address.as_bytes());
    full
}

/// The address as a scalar field element. Addresses are 160 bits, so this never reduces.
#[must_use]
pub fn address_to_field(address: &Address) -> Fr {
    Fr::from_be_bytes_mod_order(&address_to_bytes(address))
}
