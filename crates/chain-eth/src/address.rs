//! EVM account addresses: `0x` + 40 hex digits, optionally EIP-55 checksummed.

use sha3::{Digest, Keccak256};

use crate::error::EthError;

fn hex_body(address: &str) -> Result<&str, EthError> {
    let body = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))?;

    if body.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            body.len()
        )));
    }
    if !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EthError::InvalidAddress(
            "address contains non-hex characters".into(),
        ));
    }
    Ok(body)
}

/// Decode an address to its 20 raw bytes. Checksum casing is not verified.
pub fn parse_address(address: &str) -> Result<[u8; 20], EthError> {
    let body = hex_body(address)?;
    let mut out = [0u8; 20];
    hex::decode_to_slice(body, &mut out)
        .map_err(|e| EthError::InvalidAddress(format!("hex decode failed: {e}")))?;
    Ok(out)
}

/// Validate an address string.
///
/// Single-case addresses carry no checksum and are accepted as-is. Mixed
/// case must match the EIP-55 checksum exactly.
pub fn validate_address(address: &str) -> Result<(), EthError> {
    let body = hex_body(address)?;

    let is_all_lower = !body.chars().any(|c| c.is_ascii_uppercase());
    let is_all_upper = !body.chars().any(|c| c.is_ascii_lowercase());
    if is_all_lower || is_all_upper {
        return Ok(());
    }

    if checksum_address(address)? == address {
        Ok(())
    } else {
        Err(EthError::InvalidAddress("EIP-55 checksum mismatch".into()))
    }
}

/// EIP-55 mixed-case form of an address.
pub fn checksum_address(address: &str) -> Result<String, EthError> {
    let lower = hex_body(address)?.to_ascii_lowercase();
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        // Nibble i of the hash decides the case of hex letter i.
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    Ok(out)
}
