//! # Domain Module
//!
//! Configuration blob codec, digest, shared-secret distribution and the
//! configuration views derived from them.

pub mod digest;
pub mod encoding;
pub mod errors;
pub mod public_config;
pub mod publication;
pub mod shared_config;
pub mod shared_secret;

pub use digest::{compute_config_digest, verify_config_digest};
pub use encoding::{
    decode, encode, verify_layout, SetConfigEncodedComponents, MAX_ENCODED_CONFIG_SIZE,
    SUPPORTED_ENCODED_CONFIG_VERSION,
};
pub use errors::*;
pub use public_config::{OracleIdentity, PublicConfig, MAX_ORACLES};
pub use publication::{build_contract_config, OracleCredentials, ProtocolParameters};
pub use shared_config::SharedConfig;
pub use shared_secret::{SharedSecret, SharedSecretEncryptions, SHARED_SECRET_SIZE};
