//! # Off-Chain Identity Keys (Ed25519)
//!
//! Each oracle publishes the public half of its off-chain key in the contract
//! configuration. Adopting a configuration means finding our own key in that
//! list, so only seed derivation and the public key are exposed here.

use ed25519_dalek::SigningKey;

/// Ed25519 off-chain identity key. The secret scalar is wiped on drop.
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
}

impl Ed25519KeyPair {
    /// Derive the keypair from a 32-byte secret seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Public key bytes as published in configurations.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }
}
