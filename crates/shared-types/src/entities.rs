//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Configuration**: `ConfigDigest`, `ContractConfig`, `Address`
//! - **Protocol position**: `OracleId`, `EpochRound`
//! - **Transmission**: `PendingTransmissionKey`, `PendingTransmission`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CLUSTER A: CONFIGURATION
// =============================================================================

/// Length of a [`ConfigDigest`] in bytes.
pub const CONFIG_DIGEST_LENGTH: usize = 32;

/// Content hash identifying one configuration version.
///
/// Immutable once computed. The all-zero digest means "no configuration".
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ConfigDigest(pub [u8; CONFIG_DIGEST_LENGTH]);

impl ConfigDigest {
    /// The "no configuration yet" digest.
    pub const ZERO: ConfigDigest = ConfigDigest([0u8; CONFIG_DIGEST_LENGTH]);

    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; CONFIG_DIGEST_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; CONFIG_DIGEST_LENGTH] {
        &self.0
    }

    /// True for the all-zero digest.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; CONFIG_DIGEST_LENGTH]
    }
}

impl fmt::Display for ConfigDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ConfigDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigDigest({})", hex::encode(self.0))
    }
}

/// A 20-byte on-chain account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", hex::encode(self.0))
    }
}

/// Configuration as published by the on-chain contract's "config set" event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Digest over all other fields plus contract address and config count.
    pub config_digest: ConfigDigest,
    /// On-chain signing addresses, one per oracle.
    pub signers: Vec<Address>,
    /// On-chain transmit addresses, one per oracle.
    pub transmitters: Vec<Address>,
    /// Fault-tolerance bound `F`.
    pub threshold: u8,
    /// Version tag of `encoded`.
    pub encoded_config_version: u64,
    /// ABI-encoded off-chain configuration blob.
    pub encoded: Vec<u8>,
}

// =============================================================================
// CLUSTER B: PROTOCOL POSITION
// =============================================================================

/// Position of an oracle within a configuration's identity list.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
pub struct OracleId(pub u8);

impl OracleId {
    /// Index into per-oracle vectors.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for OracleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The protocol's two-level sequence number.
///
/// Ordered by epoch, then round (field order drives the derived `Ord`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
pub struct EpochRound {
    /// Incremented on leadership change.
    pub epoch: u32,
    /// Incremented within an epoch.
    pub round: u8,
}

impl EpochRound {
    /// Create a new epoch/round pair.
    pub fn new(epoch: u32, round: u8) -> Self {
        Self { epoch, round }
    }
}

impl fmt::Display for EpochRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(epoch {}, round {})", self.epoch, self.round)
    }
}

// =============================================================================
// CLUSTER C: TRANSMISSION
// =============================================================================

/// Durable key of a pending transmission.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct PendingTransmissionKey {
    /// Configuration the report was produced under.
    pub config_digest: ConfigDigest,
    /// Report epoch.
    pub epoch: u32,
    /// Report round.
    pub round: u8,
}

/// Length of [`PendingTransmissionKey::to_bytes`].
pub const PENDING_TRANSMISSION_KEY_LENGTH: usize = CONFIG_DIGEST_LENGTH + 4 + 1;

impl PendingTransmissionKey {
    /// Create a new key.
    pub fn new(config_digest: ConfigDigest, epoch_round: EpochRound) -> Self {
        Self {
            config_digest,
            epoch: epoch_round.epoch,
            round: epoch_round.round,
        }
    }

    /// Epoch and round of this key.
    pub fn epoch_round(&self) -> EpochRound {
        EpochRound::new(self.epoch, self.round)
    }

    /// Big-endian storage key: digest, epoch, round.
    ///
    /// Keys of one configuration share the digest as a prefix and sort by
    /// epoch/round within it.
    pub fn to_bytes(&self) -> [u8; PENDING_TRANSMISSION_KEY_LENGTH] {
        let mut out = [0u8; PENDING_TRANSMISSION_KEY_LENGTH];
        out[..CONFIG_DIGEST_LENGTH].copy_from_slice(&self.config_digest.0);
        out[CONFIG_DIGEST_LENGTH..CONFIG_DIGEST_LENGTH + 4].copy_from_slice(&self.epoch.to_be_bytes());
        out[CONFIG_DIGEST_LENGTH + 4] = self.round;
        out
    }

    /// Inverse of [`Self::to_bytes`]. `None` on wrong length.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != PENDING_TRANSMISSION_KEY_LENGTH {
            return None;
        }
        let mut digest = [0u8; CONFIG_DIGEST_LENGTH];
        digest.copy_from_slice(&bytes[..CONFIG_DIGEST_LENGTH]);
        let mut epoch = [0u8; 4];
        epoch.copy_from_slice(&bytes[CONFIG_DIGEST_LENGTH..CONFIG_DIGEST_LENGTH + 4]);
        Some(Self {
            config_digest: ConfigDigest(digest),
            epoch: u32::from_be_bytes(epoch),
            round: bytes[CONFIG_DIGEST_LENGTH + 4],
        })
    }
}

/// A report this node decided to submit but has not yet submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransmission {
    /// Wall-clock time the submission is scheduled for.
    pub time: DateTime<Utc>,
    /// Median observation carried by the report.
    pub median: i128,
    /// Serialized report as accepted by the contract.
    pub serialized_report: Vec<u8>,
    /// Signature `r` components.
    pub rs: Vec<[u8; 32]>,
    /// Signature `s` components.
    pub ss: Vec<[u8; 32]>,
    /// Packed signature `v` components.
    pub vs: [u8; 32],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_round_orders_by_epoch_then_round() {
        assert!(EpochRound::new(1, 200) < EpochRound::new(2, 0));
        assert!(EpochRound::new(2, 0) < EpochRound::new(2, 1));
        assert_eq!(EpochRound::new(3, 3), EpochRound::new(3, 3));
    }

    #[test]
    fn test_pending_key_bytes_roundtrip() {
        let key = PendingTransmissionKey {
            config_digest: ConfigDigest([7u8; 32]),
            epoch: 0x0102_0304,
            round: 9,
        };
        let bytes = key.to_bytes();
        assert_eq!(&bytes[32..36], &[1, 2, 3, 4]);
        assert_eq!(PendingTransmissionKey::from_bytes(&bytes), Some(key));
        assert_eq!(PendingTransmissionKey::from_bytes(&bytes[..10]), None);
    }

    #[test]
    fn test_pending_key_bytes_sort_like_epoch_round() {
        let digest = ConfigDigest([1u8; 32]);
        let a = PendingTransmissionKey::new(digest, EpochRound::new(1, 255));
        let b = PendingTransmissionKey::new(digest, EpochRound::new(2, 0));
        assert!(a.to_bytes() < b.to_bytes());
    }

    #[test]
    fn test_zero_digest() {
        assert!(ConfigDigest::ZERO.is_zero());
        assert!(!ConfigDigest([1u8; 32]).is_zero());
        assert_eq!(ConfigDigest::ZERO.to_string().len(), 64);
    }

    #[test]
    fn test_pending_transmission_survives_bincode() {
        let record = PendingTransmission {
            time: Utc::now(),
            median: -42,
            serialized_report: vec![1, 2, 3],
            rs: vec![[1u8; 32]],
            ss: vec![[2u8; 32]],
            vs: [3u8; 32],
        };
        let bytes = bincode::serialize(&record).unwrap();
        let back: PendingTransmission = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, record);
    }
}
