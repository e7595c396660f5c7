//! # Shared Secret Distribution
//!
//! The dealer encrypts one 16-byte secret separately for every oracle:
//!
//! ```text
//! ephemeral (e, E=e·G)
//! for oracle i with config key P_i:
//!     k_i = keccak256(e·P_i)[..16]
//!     c_i = AES-128(k_i, secret)
//! publish (E, keccak256(secret), [c_0 .. c_n-1])
//! ```
//!
//! Oracle i recovers `secret` from `c_i` with its own config key and checks
//! it against the published hash.

use crate::domain::errors::CryptoError;
use crate::ports::PrivateKeys;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use shared_crypto::{aes128_decrypt_block, aes128_encrypt_block, keccak256, X25519KeyPair};
use shared_types::OracleId;
use zeroize::Zeroize;

/// Length of the shared secret in bytes.
pub const SHARED_SECRET_SIZE: usize = 16;

/// Symmetric secret known to every oracle of one configuration.
pub type SharedSecret = [u8; SHARED_SECRET_SIZE];

/// Per-oracle encryptions of the shared secret, as published on-chain.
///
/// Equality compares every field; the values are public.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedSecretEncryptions {
    /// Dealer's ephemeral X25519 public point.
    pub diffie_hellman_point: [u8; 32],
    /// keccak256 of the plaintext secret.
    pub shared_secret_hash: [u8; 32],
    /// One ciphertext per oracle, in identity order.
    pub encryptions: Vec<[u8; SHARED_SECRET_SIZE]>,
}

impl SharedSecretEncryptions {
    /// Encrypt `secret` for each of `config_public_keys`.
    pub fn encrypt<R: RngCore + CryptoRng>(
        config_public_keys: &[[u8; 32]],
        secret: &SharedSecret,
        rng: &mut R,
    ) -> Result<Self, CryptoError> {
        let ephemeral = X25519KeyPair::generate(rng);
        let encryptions = config_public_keys
            .iter()
            .map(|public_key| {
                let point = ephemeral
                    .diffie_hellman(public_key)
                    .map_err(|_| CryptoError::InvalidPoint)?;
                let mut key = symmetric_key(&point);
                let ciphertext = aes128_encrypt_block(&key, *secret);
                key.zeroize();
                Ok(ciphertext)
            })
            .collect::<Result<Vec<_>, CryptoError>>()?;

        Ok(Self {
            diffie_hellman_point: ephemeral.public_key(),
            shared_secret_hash: keccak256(&[secret]),
            encryptions,
        })
    }

    /// Recover the secret as oracle `oracle_id`.
    ///
    /// Never returns a wrong secret: the plaintext must match the published
    /// hash or [`CryptoError::HashMismatch`] is returned.
    pub fn decrypt<K: PrivateKeys + ?Sized>(
        &self,
        oracle_id: OracleId,
        keys: &K,
    ) -> Result<SharedSecret, CryptoError> {
        let ciphertext = self
            .encryptions
            .get(oracle_id.index())
            .ok_or(CryptoError::OidOutOfRange {
                oracle_id: oracle_id.index(),
                count: self.encryptions.len(),
            })?;
        let point = keys
            .config_diffie_hellman(&self.diffie_hellman_point)
            .map_err(|_| CryptoError::InvalidPoint)?;
        let mut key = symmetric_key(&point);
        let mut secret = aes128_decrypt_block(&key, *ciphertext);
        key.zeroize();

        if keccak256(&[&secret]) != self.shared_secret_hash {
            secret.zeroize();
            return Err(CryptoError::HashMismatch);
        }
        Ok(secret)
    }
}

fn symmetric_key(point: &[u8; 32]) -> [u8; 16] {
    let mut key = [0u8; 16];
    key.copy_from_slice(&keccak256(&[point])[..16]);
    key
}
