//! # Hashing
//!
//! Keccak-256 (the chain's native hash) and HMAC-SHA256 keyed hashing.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use sha3::{Digest, Keccak256};

/// 256-bit hash output.
pub type Hash = [u8; 32];

/// Keccak-256 over the concatenation of `inputs`.
pub fn keccak256(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

/// HMAC-SHA256 keyed by `key` over the concatenation of `inputs`.
pub fn hmac_sha256(key: &[u8], inputs: &[&[u8]]) -> Hash {
    let mut mac = match <Hmac<Sha256> as Mac>::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    };
    for input in inputs {
        mac.update(input);
    }
    mac.finalize().into_bytes().into()
}
