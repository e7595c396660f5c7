//! # Outbound Ports (Driven Ports)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{Address, ChainError, ConfigDigest, EpochRound, PendingTransmission, PendingTransmissionKey};

/// The contract's record of its latest accepted report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmissionDetails {
    /// Configuration the latest report was produced under.
    pub config_digest: ConfigDigest,
    /// Epoch and round of the latest report.
    pub epoch_round: EpochRound,
    /// Median of the latest report.
    pub latest_answer: i128,
    /// When the latest report was accepted.
    pub latest_timestamp: DateTime<Utc>,
}

/// Submits reports to the aggregator contract.
#[async_trait]
pub trait ContractTransmitter: Send + Sync {
    /// Submit a report. `key` names the report context that is also
    /// embedded in `transmission.serialized_report`.
    async fn transmit(
        &self,
        key: &PendingTransmissionKey,
        transmission: &PendingTransmission,
    ) -> Result<(), ChainError>;

    /// The contract's latest accepted report.
    async fn latest_transmission_details(&self) -> Result<TransmissionDetails, ChainError>;

    /// Account transactions are sent from.
    fn from_address(&self) -> Address;
}
