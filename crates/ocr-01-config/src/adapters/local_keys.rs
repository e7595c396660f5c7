//! # Local Private Keys
//!
//! All three keys held in process memory. Suitable for development nodes and
//! tests; production keystores implement [`PrivateKeys`] themselves.

use crate::domain::publication::OracleCredentials;
use crate::ports::PrivateKeys;
use rand::{CryptoRng, RngCore};
use shared_crypto::{
    CryptoError, Ed25519KeyPair, RecoverableSignature, Secp256k1KeyPair, X25519KeyPair,
};
use shared_types::Address;
use zeroize::Zeroize;

/// In-memory [`PrivateKeys`].
pub struct LocalPrivateKeys {
    onchain: Secp256k1KeyPair,
    offchain: Ed25519KeyPair,
    config: X25519KeyPair,
}

impl LocalPrivateKeys {
    /// Create from existing keypairs.
    pub fn new(onchain: Secp256k1KeyPair, offchain: Ed25519KeyPair, config: X25519KeyPair) -> Self {
        Self {
            onchain,
            offchain,
            config,
        }
    }

    /// Generate all three keys from `rng`.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let onchain = loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            let candidate = Secp256k1KeyPair::from_bytes(bytes);
            bytes.zeroize();
            // Out-of-range scalars are astronomically rare; draw again.
            if let Ok(keypair) = candidate {
                break keypair;
            }
        };
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        let offchain = Ed25519KeyPair::from_seed(seed);
        seed.zeroize();
        let config = X25519KeyPair::generate(rng);
        Self::new(onchain, offchain, config)
    }

    /// Credentials to register for a configuration.
    pub fn credentials(&self, peer_id: String, transmit_address: Address) -> OracleCredentials {
        OracleCredentials {
            on_chain_signing_address: self.public_key_address_onchain(),
            transmit_address,
            offchain_public_key: self.public_key_offchain(),
            config_public_key: self.public_key_config(),
            peer_id,
        }
    }
}

impl PrivateKeys for LocalPrivateKeys {
    fn sign_onchain(&self, message: &[u8]) -> Result<RecoverableSignature, CryptoError> {
        self.onchain.sign_recoverable(message)
    }

    fn config_diffie_hellman(&self, point: &[u8; 32]) -> Result<[u8; 32], CryptoError> {
        self.config.diffie_hellman(point)
    }

    fn public_key_address_onchain(&self) -> Address {
        Address(self.onchain.address())
    }

    fn public_key_offchain(&self) -> [u8; 32] {
        self.offchain.public_key()
    }

    fn public_key_config(&self) -> [u8; 32] {
        self.config.public_key()
    }
}
