//! # Message Router Service
//!
//! Single-owner actor between the network and the two protocol phases.
//! Leader-election messages pass straight through; report-generation
//! messages are gated on the current epoch by an [`EpochRouter`]. Epoch
//! changes and inbound messages are processed on one task, so a replay
//! triggered by an epoch change always reaches report generation before
//! any message received after it.

use crate::domain::{
    Admission, DropReason, EpochChange, EpochRouter, LeaderElectionMessage, MessageWithSender,
    ProtocolMessage, ReportGenerationEvent,
};
use shared_types::OracleId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Router tuning.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Early messages held per sender.
    pub per_sender_buffer_capacity: usize,
    /// Capacity of each queue into and out of the router.
    pub queue_capacity: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            per_sender_buffer_capacity: 10,
            queue_capacity: 10,
        }
    }
}

/// Queue ends owned by the protocol side.
pub struct RouterHandles {
    /// Feed decoded network messages here.
    pub inbound: mpsc::Sender<MessageWithSender>,
    /// Leader election reports epoch changes here.
    pub epoch_changes: mpsc::Sender<EpochChange>,
    /// Messages for leader election.
    pub leader_election: mpsc::Receiver<(OracleId, LeaderElectionMessage)>,
    /// Epoch starts and messages for report generation.
    pub report_generation: mpsc::Receiver<ReportGenerationEvent>,
}

/// Epoch-aware router for one protocol instance.
pub struct MessageRouter {
    state: EpochRouter,
    inbound: mpsc::Receiver<MessageWithSender>,
    epoch_changes: mpsc::Receiver<EpochChange>,
    to_leader_election: mpsc::Sender<(OracleId, LeaderElectionMessage)>,
    to_report_generation: mpsc::Sender<ReportGenerationEvent>,
}

impl MessageRouter {
    /// Router for `n` oracles, plus the queue ends its peers use.
    pub fn new(n: usize, config: &RouterConfig) -> (Self, RouterHandles) {
        let capacity = config.queue_capacity.max(1);
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        let (epoch_tx, epoch_rx) = mpsc::channel(capacity);
        let (le_tx, le_rx) = mpsc::channel(capacity);
        let (rg_tx, rg_rx) = mpsc::channel(capacity);
        let router = Self {
            state: EpochRouter::new(n, config.per_sender_buffer_capacity),
            inbound: inbound_rx,
            epoch_changes: epoch_rx,
            to_leader_election: le_tx,
            to_report_generation: rg_tx,
        };
        let handles = RouterHandles {
            inbound: inbound_tx,
            epoch_changes: epoch_tx,
            leader_election: le_rx,
            report_generation: rg_rx,
        };
        (router, handles)
    }

    /// Route until `cancel` fires or both input queues close.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(n = self.state.sender_count(), "[ocr-03] Message router started");
        loop {
            // Epoch changes first: a message queued after an advance must
            // not overtake the replay that advance releases.
            let keep_going = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                Some(change) = self.epoch_changes.recv() => {
                    self.on_epoch_change(change, &cancel).await
                }
                Some(message) = self.inbound.recv() => {
                    self.on_message(message, &cancel).await
                }
                else => false,
            };
            if !keep_going {
                break;
            }
        }
        info!(
            epoch = self.state.current_epoch(),
            buffered = self.state.buffered(),
            "[ocr-03] Message router stopped"
        );
    }

    async fn on_epoch_change(&mut self, change: EpochChange, cancel: &CancellationToken) -> bool {
        let Some(replay) = self.state.advance(change.epoch) else {
            debug!(
                epoch = change.epoch,
                current = self.state.current_epoch(),
                "[ocr-03] Ignoring non-increasing epoch change"
            );
            return true;
        };
        info!(
            epoch = change.epoch,
            leader = %change.leader,
            replayed = replay.messages.len(),
            dropped = replay.dropped,
            "[ocr-03] Epoch advanced"
        );
        if !self
            .emit(ReportGenerationEvent::EpochStarted(change), cancel)
            .await
        {
            return false;
        }
        for (sender, message) in replay.messages {
            if !self
                .emit(ReportGenerationEvent::Message { sender, message }, cancel)
                .await
            {
                return false;
            }
        }
        true
    }

    async fn on_message(&mut self, message: MessageWithSender, cancel: &CancellationToken) -> bool {
        let sender = message.sender;
        match message.message {
            ProtocolMessage::LeaderElection(message) => {
                tokio::select! {
                    _ = cancel.cancelled() => false,
                    sent = self.to_leader_election.send((sender, message)) => sent.is_ok(),
                }
            }
            ProtocolMessage::ReportGeneration(message) => {
                let epoch_round = message.epoch_round();
                match self.state.admit(sender, message) {
                    Admission::Deliver(message) => {
                        self.emit(ReportGenerationEvent::Message { sender, message }, cancel)
                            .await
                    }
                    Admission::Buffered { evicted } => {
                        if evicted {
                            warn!(
                                sender = %sender,
                                epoch_round = %epoch_round,
                                "[ocr-03] Buffer full, evicted oldest early message"
                            );
                        } else {
                            trace!(sender = %sender, epoch_round = %epoch_round, "[ocr-03] Buffered early message");
                        }
                        true
                    }
                    Admission::Dropped(DropReason::StaleEpoch) => {
                        debug!(sender = %sender, epoch_round = %epoch_round, "[ocr-03] Dropped stale message");
                        true
                    }
                    Admission::Dropped(DropReason::UnknownSender) => {
                        warn!(sender = %sender, "[ocr-03] Dropped message from unknown sender");
                        true
                    }
                }
            }
        }
    }

    async fn emit(&self, event: ReportGenerationEvent, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            sent = self.to_report_generation.send(event) => sent.is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReportGenerationKind, ReportGenerationMessage};
    use std::time::Duration;

    fn rg(sender: u8, epoch: u32, round: u8) -> MessageWithSender {
        MessageWithSender {
            sender: OracleId(sender),
            message: ProtocolMessage::ReportGeneration(ReportGenerationMessage::new(
                ReportGenerationKind::Observe,
                epoch,
                round,
                vec![],
            )),
        }
    }

    fn delivered(sender: u8, epoch: u32, round: u8) -> ReportGenerationEvent {
        ReportGenerationEvent::Message {
            sender: OracleId(sender),
            message: ReportGenerationMessage::new(ReportGenerationKind::Observe, epoch, round, vec![]),
        }
    }

    fn change(epoch: u32) -> EpochChange {
        EpochChange {
            epoch,
            leader: OracleId(0),
        }
    }

    #[tokio::test]
    async fn test_replay_precedes_later_messages() {
        let (router, mut handles) = MessageRouter::new(4, &RouterConfig::default());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(router.run(cancel.clone()));

        handles.inbound.send(rg(2, 1, 1)).await.unwrap();
        handles.inbound.send(rg(3, 1, 1)).await.unwrap();
        // Let the router buffer both before the epoch changes.
        tokio::time::sleep(Duration::from_millis(10)).await;
        handles.epoch_changes.send(change(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        handles.inbound.send(rg(1, 1, 2)).await.unwrap();

        let rx = &mut handles.report_generation;
        assert_eq!(
            rx.recv().await.unwrap(),
            ReportGenerationEvent::EpochStarted(change(1))
        );
        assert_eq!(rx.recv().await.unwrap(), delivered(2, 1, 1));
        assert_eq!(rx.recv().await.unwrap(), delivered(3, 1, 1));
        assert_eq!(rx.recv().await.unwrap(), delivered(1, 1, 2));

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_message_queued_after_advance_follows_replay() {
        let (router, mut handles) = MessageRouter::new(4, &RouterConfig::default());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(router.run(cancel.clone()));

        handles.inbound.send(rg(2, 1, 1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        // No yield between the two sends: the router finds both queues ready.
        handles.epoch_changes.try_send(change(1)).unwrap();
        handles.inbound.try_send(rg(0, 1, 2)).unwrap();

        let rx = &mut handles.report_generation;
        assert_eq!(
            rx.recv().await.unwrap(),
            ReportGenerationEvent::EpochStarted(change(1))
        );
        assert_eq!(rx.recv().await.unwrap(), delivered(2, 1, 1));
        assert_eq!(rx.recv().await.unwrap(), delivered(0, 1, 2));

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_leader_election_passes_through() {
        let (router, mut handles) = MessageRouter::new(4, &RouterConfig::default());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(router.run(cancel.clone()));

        handles
            .inbound
            .send(MessageWithSender {
                sender: OracleId(3),
                message: ProtocolMessage::LeaderElection(LeaderElectionMessage::NewEpoch {
                    epoch: 12,
                }),
            })
            .await
            .unwrap();

        assert_eq!(
            handles.leader_election.recv().await.unwrap(),
            (OracleId(3), LeaderElectionMessage::NewEpoch { epoch: 12 })
        );
        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_stale_and_repeated_epochs() {
        let (router, mut handles) = MessageRouter::new(2, &RouterConfig::default());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(router.run(cancel.clone()));

        handles.epoch_changes.send(change(2)).await.unwrap();
        handles.epoch_changes.send(change(2)).await.unwrap();
        handles.epoch_changes.send(change(1)).await.unwrap();
        handles.inbound.send(rg(0, 1, 1)).await.unwrap();
        handles.inbound.send(rg(0, 2, 1)).await.unwrap();

        let rx = &mut handles.report_generation;
        assert_eq!(
            rx.recv().await.unwrap(),
            ReportGenerationEvent::EpochStarted(change(2))
        );
        assert_eq!(rx.recv().await.unwrap(), delivered(0, 2, 1));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(rx.try_recv().is_err());

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_blocked_output_yields_to_cancel() {
        let config = RouterConfig {
            per_sender_buffer_capacity: 10,
            queue_capacity: 1,
        };
        let (router, handles) = MessageRouter::new(1, &config);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(router.run(cancel.clone()));

        // Nobody drains report generation; the second delivery blocks.
        handles.inbound.send(rg(0, 0, 1)).await.unwrap();
        handles.inbound.send(rg(0, 0, 2)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        drop(handles);
    }

    #[tokio::test]
    async fn test_stops_when_inputs_close() {
        let (router, handles) = MessageRouter::new(1, &RouterConfig::default());
        let RouterHandles {
            inbound,
            epoch_changes,
            ..
        } = handles;
        drop(inbound);
        drop(epoch_changes);
        tokio::time::timeout(Duration::from_secs(1), router.run(CancellationToken::new()))
            .await
            .unwrap();
    }
}
