//! # In-Memory Aggregator
//!
//! Simulated aggregator contract shared by several oracles. Like the real
//! contract it only accepts reports for its current configuration with an
//! `(epoch, round)` strictly above the latest accepted one.

use crate::ports::{ContractTransmitter, TransmissionDetails};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use shared_types::{
    Address, ChainError, ConfigDigest, EpochRound, PendingTransmission, PendingTransmissionKey,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct AggregatorState {
    details: TransmissionDetails,
    accepted: Vec<(Address, PendingTransmissionKey)>,
    detail_reads: usize,
}

/// Shared contract state.
#[derive(Clone)]
pub struct InMemoryAggregator {
    state: Arc<Mutex<AggregatorState>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryAggregator {
    /// Contract configured with `config_digest` and no reports yet.
    pub fn new(config_digest: ConfigDigest) -> Self {
        Self {
            state: Arc::new(Mutex::new(AggregatorState {
                details: TransmissionDetails {
                    config_digest,
                    epoch_round: EpochRound::default(),
                    latest_answer: 0,
                    latest_timestamp: DateTime::<Utc>::default(),
                },
                accepted: Vec::new(),
                detail_reads: 0,
            })),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for the oracle transacting from `from`.
    pub fn transmitter(&self, from: Address) -> InMemoryTransmitter {
        InMemoryTransmitter {
            aggregator: self.clone(),
            from,
        }
    }

    /// Switch to a new configuration, resetting the latest report.
    pub fn set_config_digest(&self, config_digest: ConfigDigest) {
        let mut state = self.state.lock();
        state.details.config_digest = config_digest;
        state.details.epoch_round = EpochRound::default();
    }

    /// Record a report as accepted without going through a transmitter,
    /// as if another oracle had submitted it.
    pub fn accept_external(&self, epoch_round: EpochRound, answer: i128) {
        let mut state = self.state.lock();
        state.details.epoch_round = epoch_round;
        state.details.latest_answer = answer;
        state.details.latest_timestamp = Utc::now();
    }

    /// Make every call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Reports accepted through transmitters, in acceptance order.
    pub fn accepted(&self) -> Vec<(Address, PendingTransmissionKey)> {
        self.state.lock().accepted.clone()
    }

    /// Current contract details.
    pub fn details(&self) -> TransmissionDetails {
        self.state.lock().details
    }

    /// Number of `latest_transmission_details` calls served.
    pub fn detail_reads(&self) -> usize {
        self.state.lock().detail_reads
    }

    fn check(&self) -> Result<(), ChainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ChainError::CallFailed("injected chain failure".to_string()));
        }
        Ok(())
    }
}

/// [`ContractTransmitter`] for one oracle on an [`InMemoryAggregator`].
#[derive(Clone)]
pub struct InMemoryTransmitter {
    aggregator: InMemoryAggregator,
    from: Address,
}

#[async_trait]
impl ContractTransmitter for InMemoryTransmitter {
    async fn transmit(
        &self,
        key: &PendingTransmissionKey,
        transmission: &PendingTransmission,
    ) -> Result<(), ChainError> {
        self.aggregator.check()?;
        let mut state = self.aggregator.state.lock();
        if key.config_digest != state.details.config_digest {
            return Err(ChainError::CallFailed("config digest mismatch".to_string()));
        }
        if key.epoch_round() <= state.details.epoch_round {
            return Err(ChainError::CallFailed("stale report".to_string()));
        }
        state.details.epoch_round = key.epoch_round();
        state.details.latest_answer = transmission.median;
        state.details.latest_timestamp = Utc::now();
        state.accepted.push((self.from, *key));
        Ok(())
    }

    async fn latest_transmission_details(&self) -> Result<TransmissionDetails, ChainError> {
        self.aggregator.check()?;
        let mut state = self.aggregator.state.lock();
        state.detail_reads += 1;
        Ok(state.details)
    }

    fn from_address(&self) -> Address {
        self.from
    }
}
