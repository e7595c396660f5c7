//! # X25519 Key Agreement
//!
//! Used to hand every oracle its own encryption of the configuration's
//! shared secret. The dealer uses an ephemeral keypair; each oracle combines
//! its long-lived config key with the published ephemeral point.

use crate::CryptoError;
use rand::{CryptoRng, RngCore};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

/// Length of X25519 scalars and points.
pub const X25519_KEY_LENGTH: usize = 32;

/// X25519 keypair.
pub struct X25519KeyPair {
    secret: StaticSecret,
}

impl X25519KeyPair {
    /// Generate a keypair from `rng`.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; X25519_KEY_LENGTH];
        rng.fill_bytes(&mut bytes);
        let keypair = Self::from_bytes(bytes);
        bytes.zeroize();
        keypair
    }

    /// Create from a secret scalar (clamped on use).
    pub fn from_bytes(bytes: [u8; X25519_KEY_LENGTH]) -> Self {
        Self {
            secret: StaticSecret::from(bytes),
        }
    }

    /// Public point.
    pub fn public_key(&self) -> [u8; X25519_KEY_LENGTH] {
        PublicKey::from(&self.secret).to_bytes()
    }

    /// Shared point with `their_public`. Low-order points are rejected.
    pub fn diffie_hellman(
        &self,
        their_public: &[u8; X25519_KEY_LENGTH],
    ) -> Result<[u8; X25519_KEY_LENGTH], CryptoError> {
        let shared = self.secret.diffie_hellman(&PublicKey::from(*their_public));
        if !shared.was_contributory() {
            return Err(CryptoError::NonContributory);
        }
        Ok(shared.to_bytes())
    }
}
