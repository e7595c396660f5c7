//! # Outbound Ports
//!
//! Key material is held outside the protocol core (keystore, HSM). The core
//! only ever asks for public keys, on-chain signatures and Diffie-Hellman
//! results.

use shared_crypto::{CryptoError, RecoverableSignature};
use shared_types::Address;

/// This node's private keys.
pub trait PrivateKeys: Send + Sync {
    /// Sign a report for on-chain verification.
    fn sign_onchain(&self, message: &[u8]) -> Result<RecoverableSignature, CryptoError>;

    /// X25519 exchange between our config key and `point`.
    fn config_diffie_hellman(&self, point: &[u8; 32]) -> Result<[u8; 32], CryptoError>;

    /// Address of our on-chain signing key.
    fn public_key_address_onchain(&self) -> Address;

    /// Our Ed25519 off-chain public key.
    fn public_key_offchain(&self) -> [u8; 32];

    /// Our X25519 config public key.
    fn public_key_config(&self) -> [u8; 32];
}
