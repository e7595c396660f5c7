//! # Encoded Configuration Blob
//!
//! The off-chain half of a configuration travels on-chain as one ABI tuple:
//!
//! ```text
//! (int64 deltaProgress, int64 deltaResend, int64 deltaRound,
//!  int64 deltaGrace, int64 deltaC, uint64 alphaPPB, int64 deltaStage,
//!  uint8 rMax, uint8[] s, bytes32[] offchainPublicKeys, string peerIDs,
//!  (bytes32 diffieHellmanPoint, bytes32 sharedSecretHash,
//!   bytes16[] encryptions) sharedSecretEncryptions)
//! ```
//!
//! Durations are nanoseconds. Peer ids are joined with `,`.

use crate::domain::errors::ConfigError;
use crate::domain::shared_secret::SharedSecretEncryptions;
use alloy_primitives::FixedBytes;
use alloy_sol_types::{SolStruct, SolValue};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Blobs larger than this are rejected before any parsing.
pub const MAX_ENCODED_CONFIG_SIZE: usize = 20_000;

/// The only `encodedConfigVersion` this node interprets.
pub const SUPPORTED_ENCODED_CONFIG_VERSION: u64 = 1;

const PEER_ID_SEPARATOR: &str = ",";

mod wire {
    alloy_sol_types::sol! {
        struct EncodedSharedSecretEncryptions {
            bytes32 diffieHellmanPoint;
            bytes32 sharedSecretHash;
            bytes16[] encryptions;
        }

        struct EncodedConfig {
            int64 deltaProgress;
            int64 deltaResend;
            int64 deltaRound;
            int64 deltaGrace;
            int64 deltaC;
            uint64 alphaPPB;
            int64 deltaStage;
            uint8 rMax;
            uint8[] s;
            bytes32[] offchainPublicKeys;
            string peerIDs;
            EncodedSharedSecretEncryptions sharedSecretEncryptions;
        }
    }
}

/// In-memory form of the encoded tuple. Field order must follow the
/// declared wire struct; [`verify_layout`] enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetConfigEncodedComponents {
    /// Nanoseconds
    pub delta_progress: i64,
    /// Nanoseconds
    pub delta_resend: i64,
    /// Nanoseconds
    pub delta_round: i64,
    /// Nanoseconds
    pub delta_grace: i64,
    /// Nanoseconds
    pub delta_c: i64,
    /// Deviation threshold in parts per billion
    #[serde(rename = "alphaPPB")]
    pub alpha_ppb: u64,
    /// Nanoseconds
    pub delta_stage: i64,
    /// Maximum rounds per epoch
    pub r_max: u8,
    /// Transmission stage weights
    pub s: Vec<u8>,
    /// Ed25519 off-chain keys, in identity order
    pub offchain_public_keys: Vec<[u8; 32]>,
    /// Peer ids, in identity order
    #[serde(rename = "peerIDs")]
    pub peer_ids: Vec<String>,
    /// Per-oracle shared-secret encryptions
    pub shared_secret_encryptions: SharedSecretEncryptions,
}

// =============================================================================
// LAYOUT SELF-CHECK
// =============================================================================

static LAYOUT_CHECK: OnceLock<Result<(), ConfigError>> = OnceLock::new();

/// Check once per process that the wire struct's field names match the
/// in-memory struct's serialized field names, in order.
pub fn verify_layout() -> Result<(), ConfigError> {
    LAYOUT_CHECK.get_or_init(check_layout).clone()
}

fn check_layout() -> Result<(), ConfigError> {
    let value = serde_json::to_value(SetConfigEncodedComponents::default())
        .map_err(|e| ConfigError::LayoutMismatch(e.to_string()))?;
    compare_names(
        "encoded config",
        &value,
        &declared_names(&wire::EncodedConfig::eip712_root_type()),
    )?;
    let nested = value
        .get("sharedSecretEncryptions")
        .ok_or_else(|| ConfigError::LayoutMismatch("missing sharedSecretEncryptions".into()))?;
    compare_names(
        "sharedSecretEncryptions",
        nested,
        &declared_names(&wire::EncodedSharedSecretEncryptions::eip712_root_type()),
    )
}

/// Member names of a `Name(type member,...)` type string.
fn declared_names(root_type: &str) -> Vec<String> {
    let members = root_type
        .split_once('(')
        .map(|(_, rest)| rest.trim_end_matches(')'))
        .unwrap_or_default();
    members
        .split(',')
        .filter_map(|member| member.rsplit(' ').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn compare_names(
    what: &str,
    value: &serde_json::Value,
    declared: &[String],
) -> Result<(), ConfigError> {
    let object = value
        .as_object()
        .ok_or_else(|| ConfigError::LayoutMismatch(format!("{what} is not a struct")))?;
    let actual: Vec<&str> = object.keys().map(String::as_str).collect();
    if actual != declared {
        return Err(ConfigError::LayoutMismatch(format!(
            "{what}: struct fields {actual:?} != declared {declared:?}"
        )));
    }
    Ok(())
}

// =============================================================================
// ENCODE / DECODE
// =============================================================================

/// Encode the components. Fails with [`ConfigError::TooLarge`] if the result
/// exceeds [`MAX_ENCODED_CONFIG_SIZE`].
pub fn encode(components: &SetConfigEncodedComponents) -> Result<Vec<u8>, ConfigError> {
    verify_layout()?;
    if let Some(bad) = components
        .peer_ids
        .iter()
        .find(|id| id.is_empty() || id.contains(PEER_ID_SEPARATOR))
    {
        return Err(ConfigError::InvalidParameters(format!(
            "peer id {bad:?} is empty or contains {PEER_ID_SEPARATOR:?}"
        )));
    }

    let encoded = to_wire(components).abi_encode();
    if encoded.len() > MAX_ENCODED_CONFIG_SIZE {
        return Err(ConfigError::TooLarge {
            size: encoded.len(),
            limit: MAX_ENCODED_CONFIG_SIZE,
        });
    }
    Ok(encoded)
}

/// Decode a blob. Oversized input is rejected before parsing.
pub fn decode(encoded: &[u8]) -> Result<SetConfigEncodedComponents, ConfigError> {
    if encoded.len() > MAX_ENCODED_CONFIG_SIZE {
        return Err(ConfigError::TooLarge {
            size: encoded.len(),
            limit: MAX_ENCODED_CONFIG_SIZE,
        });
    }
    verify_layout()?;

    let wire = wire::EncodedConfig::abi_decode(encoded, true)
        .map_err(|e| ConfigError::DecodeFailed(e.to_string()))?;
    Ok(from_wire(wire))
}

fn to_wire(c: &SetConfigEncodedComponents) -> wire::EncodedConfig {
    let e = &c.shared_secret_encryptions;
    wire::EncodedConfig {
        deltaProgress: c.delta_progress,
        deltaResend: c.delta_resend,
        deltaRound: c.delta_round,
        deltaGrace: c.delta_grace,
        deltaC: c.delta_c,
        alphaPPB: c.alpha_ppb,
        deltaStage: c.delta_stage,
        rMax: c.r_max,
        s: c.s.clone(),
        offchainPublicKeys: c.offchain_public_keys.iter().copied().map(FixedBytes).collect(),
        peerIDs: c.peer_ids.join(PEER_ID_SEPARATOR),
        sharedSecretEncryptions: wire::EncodedSharedSecretEncryptions {
            diffieHellmanPoint: FixedBytes(e.diffie_hellman_point),
            sharedSecretHash: FixedBytes(e.shared_secret_hash),
            encryptions: e.encryptions.iter().copied().map(FixedBytes).collect(),
        },
    }
}

fn from_wire(w: wire::EncodedConfig) -> SetConfigEncodedComponents {
    let peer_ids = if w.peerIDs.is_empty() {
        Vec::new()
    } else {
        w.peerIDs.split(PEER_ID_SEPARATOR).map(str::to_string).collect()
    };
    let e = w.sharedSecretEncryptions;
    SetConfigEncodedComponents {
        delta_progress: w.deltaProgress,
        delta_resend: w.deltaResend,
        delta_round: w.deltaRound,
        delta_grace: w.deltaGrace,
        delta_c: w.deltaC,
        alpha_ppb: w.alphaPPB,
        delta_stage: w.deltaStage,
        r_max: w.rMax,
        s: w.s,
        offchain_public_keys: w.offchainPublicKeys.into_iter().map(|k| k.0).collect(),
        peer_ids,
        shared_secret_encryptions: SharedSecretEncryptions {
            diffie_hellman_point: e.diffieHellmanPoint.0,
            shared_secret_hash: e.sharedSecretHash.0,
            encryptions: e.encryptions.into_iter().map(|c| c.0).collect(),
        },
    }
}
