//! # Shared Crypto - Primitives for Off-Chain Reporting
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256, HMAC-SHA256 | Digests, secret hashes, key derivation |
//! | `dh` | X25519 | Shared-secret key agreement |
//! | `symmetric` | AES-128 (single block) | Per-oracle shared-secret encryption |
//! | `signatures` | Ed25519 | Off-chain identity keys |
//! | `ecdsa` | secp256k1 | On-chain signing keys and addresses |
//!
//! ## Security Properties
//!
//! - **X25519**: non-contributory (low-order) results are rejected
//! - **Ed25519**: off-chain keys derived deterministically from a seed
//! - **secp256k1**: RFC 6979 deterministic, recoverable signatures

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dh;
pub mod ecdsa;
pub mod errors;
pub mod hashing;
pub mod signatures;
pub mod symmetric;

// Re-exports
pub use dh::{X25519KeyPair, X25519_KEY_LENGTH};
pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey, RecoverableSignature};
pub use errors::CryptoError;
pub use hashing::{hmac_sha256, keccak256, Hash};
pub use signatures::Ed25519KeyPair;
pub use symmetric::{aes128_decrypt_block, aes128_encrypt_block, AES_BLOCK_LENGTH};
