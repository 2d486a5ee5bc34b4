//! Solana public keys and their Base58 address form.
//!
//! A Solana address is the Base58 encoding of a raw 32-byte Ed25519 public
//! key, with no hashing step.

use std::fmt;
use std::str::FromStr;

use crate::error::SolError;

/// A 32-byte Solana public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pubkey([u8; 32]);

impl Pubkey {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Build a key from a raw account identifier as returned by a wallet.
    pub fn try_from_slice(raw: &[u8]) -> Result<Self, SolError> {
        let bytes: [u8; 32] = raw.try_into().map_err(|_| {
            SolError::InvalidAddress(format!("expected 32 bytes, got {}", raw.len()))
        })?;
        Ok(Self(bytes))
    }

    pub const fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Base58 address form.
    pub fn to_address(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl FromStr for Pubkey {
    type Err = SolError;

    fn from_str(address: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(address)
            .into_vec()
            .map_err(|e| SolError::InvalidAddress(format!("base58 decode failed: {e}")))?;
        Self::try_from_slice(&bytes)
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_address())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self.to_address())
    }
}

impl From<[u8; 32]> for Pubkey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Check that `address` is Base58 and decodes to exactly 32 bytes.
pub fn validate_address(address: &str) -> Result<(), SolError> {
    address.parse::<Pubkey>().map(|_| ())
}
