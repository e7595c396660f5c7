//! # Attested Reports

use shared_types::{EpochRound, PendingTransmission};

/// A report signed by enough oracles to be accepted on-chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedReport {
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

impl AttestedReport {
    /// Pending record for this report, scheduled at `time`.
    pub fn into_pending(self, time: chrono::DateTime<chrono::Utc>) -> PendingTransmission {
        PendingTransmission {
            time,
            median: self.median,
            serialized_report: self.serialized_report,
            rs: self.rs,
            ss: self.ss,
            vs: self.vs,
        }
    }
}

/// Report generation finalized a report for `epoch_round`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmitEvent {
    /// Epoch and round the report was finalized in.
    pub epoch_round: EpochRound,
    /// The report.
    pub report: AttestedReport,
}
