//! # Outbound Ports (Driven Ports)
//!
//! Leader election and report generation are not part of this workspace.
//! The supervisor hands them one [`ProtocolInstance`] per adopted
//! configuration, wired to the router, the network and the scheduler.

use async_trait::async_trait;
use ocr_01_config::SharedConfig;
use ocr_03_message_router::{EpochChange, LeaderElectionMessage, NetworkSender, ReportGenerationEvent};
use ocr_04_transmission::TransmitEvent;
use shared_types::OracleId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Everything one protocol instance runs on.
pub struct ProtocolInstance {
    /// Configuration of the instance.
    pub shared_config: Arc<SharedConfig>,
    /// This node's index in it.
    pub oracle_id: OracleId,
    /// Outbound protocol messages.
    pub network: NetworkSender,
    /// Report epoch changes to the router.
    pub epoch_changes: mpsc::Sender<EpochChange>,
    /// Inbound leader-election messages.
    pub leader_election: mpsc::Receiver<(OracleId, LeaderElectionMessage)>,
    /// Epoch starts and epoch-gated inbound report-generation messages.
    pub report_generation: mpsc::Receiver<ReportGenerationEvent>,
    /// Hand finalized reports to the transmission scheduler.
    pub transmit: mpsc::Sender<TransmitEvent>,
}

/// Leader election plus report generation.
#[async_trait]
pub trait ReportingProtocol: Send + Sync {
    /// Run `instance` until `cancel` fires. Must return promptly once it does.
    async fn run(&self, instance: ProtocolInstance, cancel: CancellationToken);
}
