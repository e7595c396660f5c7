//! # Epoch Router
//!
//! Pure routing state for report-generation messages:
//!
//! | Message epoch | Action |
//! |---------------|--------|
//! | `< current`   | drop |
//! | `== current`  | deliver now |
//! | `> current`   | buffer per sender, replay on [`EpochRouter::advance`] |

use super::buffer::MessageBuffer;
use super::messages::ReportGenerationMessage;
use shared_types::OracleId;

/// Outcome of admitting one report-generation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Belongs to the current epoch.
    Deliver(ReportGenerationMessage),
    /// Held for a later epoch.
    Buffered {
        /// Whether an older buffered message was evicted to make room.
        evicted: bool,
    },
    /// Discarded.
    Dropped(DropReason),
}

/// Why a message was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// From an epoch already left behind.
    StaleEpoch,
    /// Sender index outside the configuration.
    UnknownSender,
}

/// Epoch tracking and per-sender buffers for one protocol instance.
#[derive(Debug, Clone)]
pub struct EpochRouter {
    current_epoch: u32,
    buffers: Vec<MessageBuffer>,
}

impl EpochRouter {
    /// Router for `n` oracles starting in epoch 0.
    pub fn new(n: usize, buffer_capacity: usize) -> Self {
        Self {
            current_epoch: 0,
            buffers: (0..n).map(|_| MessageBuffer::new(buffer_capacity)).collect(),
        }
    }

    /// Epoch messages are currently delivered for.
    pub fn current_epoch(&self) -> u32 {
        self.current_epoch
    }

    /// Route one message from `sender`.
    pub fn admit(&mut self, sender: OracleId, message: ReportGenerationMessage) -> Admission {
        let Some(buffer) = self.buffers.get_mut(sender.index()) else {
            return Admission::Dropped(DropReason::UnknownSender);
        };
        if message.epoch < self.current_epoch {
            Admission::Dropped(DropReason::StaleEpoch)
        } else if message.epoch == self.current_epoch {
            Admission::Deliver(message)
        } else {
            let evicted = buffer.push(message).is_some();
            Admission::Buffered { evicted }
        }
    }

    /// Move to `epoch` and return the buffered messages now deliverable,
    /// in sender order and per-sender arrival order.
    ///
    /// Returns `None` (and changes nothing) unless `epoch` is strictly
    /// greater than the current epoch.
    pub fn advance(&mut self, epoch: u32) -> Option<Replay> {
        if epoch <= self.current_epoch {
            return None;
        }
        self.current_epoch = epoch;
        let mut replay = Replay::default();
        for (index, buffer) in self.buffers.iter_mut().enumerate() {
            let (delivered, dropped) = buffer.drain_epoch(epoch);
            replay.dropped += dropped;
            let sender = OracleId(index as u8);
            replay
                .messages
                .extend(delivered.into_iter().map(|message| (sender, message)));
        }
        Some(replay)
    }

    /// Number of senders the router was built for.
    pub fn sender_count(&self) -> usize {
        self.buffers.len()
    }

    /// Total buffered messages across senders.
    pub fn buffered(&self) -> usize {
        self.buffers.iter().map(MessageBuffer::len).sum()
    }
}

/// Messages released by an epoch advance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replay {
    /// Deliverable messages with their senders.
    pub messages: Vec<(OracleId, ReportGenerationMessage)>,
    /// Buffered messages discarded as stale.
    pub dropped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::messages::ReportGenerationKind;

    fn msg(epoch: u32, round: u8) -> ReportGenerationMessage {
        ReportGenerationMessage::new(ReportGenerationKind::Report, epoch, round, vec![round])
    }

    #[test]
    fn test_admit_by_epoch() {
        let mut router = EpochRouter::new(4, 10);
        router.advance(5);

        assert_eq!(
            router.admit(OracleId(1), msg(4, 1)),
            Admission::Dropped(DropReason::StaleEpoch)
        );
        assert_eq!(router.admit(OracleId(1), msg(5, 1)), Admission::Deliver(msg(5, 1)));
        assert_eq!(
            router.admit(OracleId(1), msg(6, 1)),
            Admission::Buffered { evicted: false }
        );
        assert_eq!(router.buffered(), 1);
    }

    #[test]
    fn test_unknown_sender_dropped() {
        let mut router = EpochRouter::new(4, 10);
        assert_eq!(
            router.admit(OracleId(4), msg(0, 1)),
            Admission::Dropped(DropReason::UnknownSender)
        );
    }

    #[test]
    fn test_advance_replays_in_sender_order_once() {
        let mut router = EpochRouter::new(3, 10);
        router.admit(OracleId(2), msg(1, 1));
        router.admit(OracleId(0), msg(1, 2));
        router.admit(OracleId(0), msg(2, 1));

        let replay = router.advance(1).unwrap();
        assert_eq!(
            replay.messages,
            vec![(OracleId(0), msg(1, 2)), (OracleId(2), msg(1, 1))]
        );
        assert_eq!(router.buffered(), 1);

        let replay = router.advance(2).unwrap();
        assert_eq!(replay.messages, vec![(OracleId(0), msg(2, 1))]);
        assert_eq!(router.buffered(), 0);
    }

    #[test]
    fn test_advance_skipping_epochs_drops_intermediate() {
        let mut router = EpochRouter::new(2, 10);
        router.admit(OracleId(1), msg(1, 1));
        router.admit(OracleId(1), msg(2, 1));
        router.admit(OracleId(1), msg(4, 1));

        let replay = router.advance(3).unwrap();
        assert!(replay.messages.is_empty());
        assert_eq!(replay.dropped, 2);
        assert_eq!(router.buffered(), 1);
    }

    #[test]
    fn test_non_increasing_advance_ignored() {
        let mut router = EpochRouter::new(2, 10);
        router.advance(3);
        router.admit(OracleId(0), msg(4, 1));

        assert_eq!(router.advance(3), None);
        assert_eq!(router.advance(2), None);
        assert_eq!(router.current_epoch(), 3);
        assert_eq!(router.buffered(), 1);
    }

    #[test]
    fn test_overflow_reports_eviction() {
        let mut router = EpochRouter::new(1, 2);
        router.admit(OracleId(0), msg(1, 1));
        router.admit(OracleId(0), msg(1, 2));
        assert_eq!(
            router.admit(OracleId(0), msg(1, 3)),
            Admission::Buffered { evicted: true }
        );
        let replay = router.advance(1).unwrap();
        assert_eq!(
            replay.messages,
            vec![(OracleId(0), msg(1, 2)), (OracleId(0), msg(1, 3))]
        );
    }
}
