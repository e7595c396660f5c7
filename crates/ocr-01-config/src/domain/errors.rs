//! # Domain Errors
//!
//! Failures while interpreting a newly observed configuration. Any of them
//! aborts adoption of that configuration only.

use shared_types::Address;
use thiserror::Error;

/// Encoding, decoding and validation failures of the configuration blob.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Blob exceeds the resource-exhaustion bound.
    #[error("Encoded config is {size} bytes, limit is {limit}")]
    TooLarge {
        /// Actual size in bytes
        size: usize,
        /// Maximum accepted size
        limit: usize,
    },

    /// Blob is not a well-formed config tuple.
    #[error("Failed to decode config: {0}")]
    DecodeFailed(String),

    /// The contract published a blob version this node cannot interpret.
    #[error("Unsupported encoded config version {got}, expected {expected}")]
    UnknownVersion {
        /// Version found on-chain
        got: u64,
        /// Version this node supports
        expected: u64,
    },

    /// Protocol parameters violate a structural constraint.
    #[error("Invalid config parameters: {0}")]
    InvalidParameters(String),

    /// Declared tuple layout disagrees with the in-memory struct.
    #[error("Encoded config layout mismatch: {0}")]
    LayoutMismatch(String),
}

/// Shared-secret decryption failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Recovered plaintext does not hash to the published secret hash.
    #[error("Shared secret hash mismatch")]
    HashMismatch,

    /// No ciphertext exists for this oracle position.
    #[error("Oracle id {oracle_id} out of range of {count} encryptions")]
    OidOutOfRange {
        /// Requested position
        oracle_id: usize,
        /// Number of ciphertexts
        count: usize,
    },

    /// The Diffie-Hellman exchange produced a low-order point.
    #[error("Invalid Diffie-Hellman point")]
    InvalidPoint,
}

/// This node's identity does not fit the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// Our on-chain signing address is not among the oracle identities.
    #[error("Signing address {0} not in config")]
    NotInConfig(Address),

    /// The identity at our position lists a different off-chain key.
    #[error("Off-chain public key mismatch at oracle {0}")]
    OffchainKeyMismatch(u8),

    /// The identity at our position lists a different peer id.
    #[error("Peer id mismatch at oracle {oracle_id}: config has {expected}, node has {actual}")]
    PeerIdMismatch {
        /// Our position
        oracle_id: u8,
        /// Peer id in the config
        expected: String,
        /// Our peer id
        actual: String,
    },

    /// The identity at our position lists a different transmit address.
    #[error("Transmit address mismatch at oracle {oracle_id}: config has {expected}, node has {actual}")]
    TransmitAddressMismatch {
        /// Our position
        oracle_id: u8,
        /// Transmit address in the config
        expected: Address,
        /// Our transmit address
        actual: Address,
    },
}

/// Failure to derive this node's [`crate::SharedConfig`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DerivationError {
    /// The blob could not be interpreted.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The shared secret could not be recovered.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// This node cannot participate in the configuration.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Result alias for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;
