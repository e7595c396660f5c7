//! # Protocol Messages
//!
//! The message set exchanged between oracles. Payloads (observations,
//! signatures, reports) are opaque here; only the phase and the
//! `(epoch, round)` stamp matter for routing.

use serde::{Deserialize, Serialize};
use shared_types::{EpochRound, OracleId};

/// A message for the leader-election phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaderElectionMessage {
    /// Sender wants to move to `epoch`.
    NewEpoch {
        /// Proposed epoch.
        epoch: u32,
    },
}

/// Step of the report-generation phase a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportGenerationKind {
    /// Leader asks followers to observe.
    ObserveReq,
    /// Follower's signed observation.
    Observe,
    /// Leader proposes a report from collected observations.
    ReportReq,
    /// Follower's signature over the proposed report.
    Report,
    /// Leader's attested report.
    Final,
    /// Follower echoes the attested report.
    FinalEcho,
}

/// A message for the report-generation phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportGenerationMessage {
    /// Protocol step.
    pub kind: ReportGenerationKind,
    /// Epoch the message was produced in.
    pub epoch: u32,
    /// Round within the epoch.
    pub round: u8,
    /// Opaque step payload.
    pub payload: Vec<u8>,
}

impl ReportGenerationMessage {
    /// Create a message.
    pub fn new(kind: ReportGenerationKind, epoch: u32, round: u8, payload: Vec<u8>) -> Self {
        Self {
            kind,
            epoch,
            round,
            payload,
        }
    }

    /// Epoch and round stamp.
    pub fn epoch_round(&self) -> EpochRound {
        EpochRound::new(self.epoch, self.round)
    }
}

/// Any protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolMessage {
    /// Routed straight to leader election.
    LeaderElection(LeaderElectionMessage),
    /// Routed through the epoch buffer.
    ReportGeneration(ReportGenerationMessage),
}

/// A decoded message and the oracle it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageWithSender {
    /// Sending oracle.
    pub sender: OracleId,
    /// Decoded message.
    pub message: ProtocolMessage,
}

/// Raw bytes and the oracle they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMessageWithSender {
    /// Sending oracle.
    pub sender: OracleId,
    /// Encoded message.
    pub payload: Vec<u8>,
}

/// Leader election announcing a new epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochChange {
    /// The new epoch.
    pub epoch: u32,
    /// Leader of the new epoch.
    pub leader: OracleId,
}

/// What the report-generation phase receives, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportGenerationEvent {
    /// A new epoch started; earlier-epoch state can be discarded.
    EpochStarted(EpochChange),
    /// A message for the current epoch.
    Message {
        /// Sending oracle.
        sender: OracleId,
        /// The message.
        message: ReportGenerationMessage,
    },
}
