//! Execution-layer address helpers.

use crate::errors::CoreError;
use crate::types::H160;
use ethers::utils::keccak256;

/// Derives the execution address of a native account: the last 20 bytes of
/// the Keccak-256 hash of its public key.
pub fn derive_execution_address(public_key: &[u8]) -> H160 {
    let hash = keccak256(public_key);
    H160::from_slice(&hash[12..])
}

/// Parses a `0x`-prefixed 20-byte hex address.
pub fn parse_execution_address(input: &str) -> Result<H160, CoreError> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .ok_or_else(|| CoreError::InvalidAddress(input.to_string()))?;
    if digits.len() != 40 {
        return Err(CoreError::InvalidAddress(input.to_string()));
    }
    let bytes = hex::decode(digits).map_err(|_| CoreError::InvalidAddress(input.to_string()))?;
    Ok(H160::from_slice(&bytes))
}

/// Lowercase `0x`-prefixed rendering of an execution address.
pub fn format_execution_address(address: &H160) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}
