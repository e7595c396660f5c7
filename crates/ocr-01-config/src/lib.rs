//! # OCR-01 Configuration
//!
//! Encoding, digest and shared-secret distribution for reporting
//! configurations, and derivation of this node's usable [`SharedConfig`].
//!
//! **Subsystem ID:** 1
//! **Architecture:** Hexagonal (domain + ports/adapters), pure library
//!
//! ## Pipeline
//!
//! ```text
//! ContractConfig ──decode──▶ PublicConfig + SharedSecretEncryptions
//!                                   │ locate self by signing address
//!                                   ▼
//!                            decrypt(own X25519 key) ──▶ SharedConfig
//! ```
//!
//! ## Guards
//!
//! | Guard | Failure |
//! |-------|---------|
//! | Blob size (20 000 bytes) | `ConfigError::TooLarge` |
//! | Unsupported blob version | `ConfigError::UnknownVersion` |
//! | Parameter constraints (`3f < n`, `sum(S) == n`, ...) | `ConfigError::InvalidParameters` |
//! | Secret hash | `CryptoError::HashMismatch` |
//! | Own identity | `IdentityError::*` |
//!
//! ## Module Structure
//!
//! ```text
//! ocr-01-config/
//! ├── domain/      # encoding (sol! wire struct), digest, shared_secret, public/shared config
//! ├── ports/       # PrivateKeys
//! └── adapters/    # LocalPrivateKeys
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::LocalPrivateKeys;
pub use domain::{
    build_contract_config, compute_config_digest, decode, encode, verify_config_digest,
    verify_layout, ConfigError, ConfigResult, CryptoError, DerivationError, IdentityError,
    OracleCredentials, OracleIdentity, ProtocolParameters, PublicConfig,
    SetConfigEncodedComponents, SharedConfig, SharedSecret, SharedSecretEncryptions,
    MAX_ENCODED_CONFIG_SIZE, MAX_ORACLES, SHARED_SECRET_SIZE, SUPPORTED_ENCODED_CONFIG_VERSION,
};
pub use ports::PrivateKeys;
