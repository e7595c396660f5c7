//! # On-Chain Signing Keys (secp256k1)
//!
//! Report signatures verified by the aggregator contract, and the chain
//! address each signing key controls.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization, so `(r, s, v)` is canonical
//! - Recovery id is carried so the contract can `ecrecover` the signer

use crate::hashing::keccak256;
use crate::CryptoError;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use zeroize::Zeroize;

/// Compressed secp256k1 public key (33 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Secp256k1PublicKey([u8; 33]);

impl Secp256k1PublicKey {
    /// Create from compressed bytes (33 bytes, starting with 0x02 or 0x03).
    pub fn from_bytes(bytes: [u8; 33]) -> Result<Self, CryptoError> {
        VerifyingKey::from_sec1_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Raw compressed bytes.
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    /// Chain address: last 20 bytes of keccak256 over the uncompressed point
    /// without its 0x04 prefix.
    pub fn address(&self) -> Result<[u8; 20], CryptoError> {
        let key =
            VerifyingKey::from_sec1_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(address_of(&key))
    }
}

fn address_of(key: &VerifyingKey) -> [u8; 20] {
    let uncompressed = key.to_encoded_point(false);
    let hash = keccak256(&[&uncompressed.as_bytes()[1..]]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Signature in the `(r, s, v)` form the contract expects. `v` is the
/// recovery id (0 or 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    /// Signature `r` component
    pub r: [u8; 32],
    /// Signature `s` component
    pub s: [u8; 32],
    /// Recovery id
    pub v: u8,
}

impl RecoverableSignature {
    /// Recover the signer's address for a message signed with
    /// [`Secp256k1KeyPair::sign_recoverable`].
    pub fn recover_address(&self, message: &[u8]) -> Result<[u8; 20], CryptoError> {
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);
        let signature =
            Signature::from_slice(&rs).map_err(|_| CryptoError::SignatureVerificationFailed)?;
        let recovery_id =
            RecoveryId::from_byte(self.v).ok_or(CryptoError::SignatureVerificationFailed)?;
        let key = VerifyingKey::recover_from_prehash(&keccak256(&[message]), &signature, recovery_id)
            .map_err(|_| CryptoError::SignatureVerificationFailed)?;
        Ok(address_of(&key))
    }
}

/// secp256k1 signing keypair.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Public key (compressed, 33 bytes).
    pub fn public_key(&self) -> Secp256k1PublicKey {
        let point = self.signing_key.verifying_key().to_encoded_point(true);
        let mut bytes = [0u8; 33];
        bytes.copy_from_slice(point.as_bytes());
        Secp256k1PublicKey(bytes)
    }

    /// Chain address controlled by this key.
    pub fn address(&self) -> [u8; 20] {
        address_of(self.signing_key.verifying_key())
    }

    /// Sign keccak256(`message`), returning a recoverable signature.
    pub fn sign_recoverable(&self, message: &[u8]) -> Result<RecoverableSignature, CryptoError> {
        let digest = keccak256(&[message]);
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(RecoverableSignature {
            r,
            s,
            v: recovery_id.to_byte(),
        })
    }

    /// Secret key bytes (for serialization).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

impl Drop for Secp256k1KeyPair {
    fn drop(&mut self) {
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}
