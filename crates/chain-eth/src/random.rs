//! Random EVM-shaped values for the simulated wallet connector.

use rand::RngCore;
use rand_core::OsRng;

/// Length of an `r || s || v` ECDSA signature.
pub const SIGNATURE_LEN: usize = 65;

/// Fixed-size array of cryptographically secure random bytes.
pub fn random_bytes_fixed<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// `0x` + 40 lowercase hex digits.
pub fn random_address() -> String {
    format!("0x{}", hex::encode(random_bytes_fixed::<20>()))
}

/// `0x` + 130 lowercase hex digits, the shape of a 65-byte signature.
pub fn random_signature() -> String {
    format!("0x{}", hex::encode(random_bytes_fixed::<SIGNATURE_LEN>()))
}
