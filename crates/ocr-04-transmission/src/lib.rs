//! # OCR-04 Transmission
//!
//! Decides which finalized reports go on-chain, staggers oracles so that
//! usually only one of them pays for the transaction, and keeps every
//! scheduled submission durable until it fires.
//!
//! **Subsystem ID:** 4
//! **Architecture:** Hexagonal, single-owner actor
//!
//! ## Rules
//!
//! | Step | Rule |
//! |------|------|
//! | Accept | contract digest matches and contract `(epoch, round)` is older |
//! | Gate | first report, or median moved more than `alpha_ppb`, or contract caught up |
//! | Stage | `delay = stage(π[oracle]) * delta_stage`, π keyed by the shared transmission-order key |
//! | Persist | durable record written before the timer is armed |
//! | Fire | record deleted, contract re-checked, submitted once, never retried |
//! | Recover | unexpired records re-queued; of the expired, only the latest fires |
//!
//! ## Module Structure
//!
//! ```text
//! ocr-04-transmission/
//! ├── domain/      # deviation gate, order, pending queue, reports
//! ├── ports/       # ContractTransmitter
//! ├── adapters/    # InMemoryAggregator
//! └── service.rs   # TransmissionScheduler
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{InMemoryAggregator, InMemoryTransmitter};
pub use domain::{
    deviates, permutation, plan_recovery, should_transmit, stage_of, AttestedReport,
    LatestScheduled, PendingQueue, RecoveryPlan, ScheduledTransmission, TransmissionSchedule,
    TransmitEvent,
};
pub use ports::{ContractTransmitter, TransmissionDetails};
pub use service::{
    EventOutcome, FireOutcome, TransmissionConfig, TransmissionContext, TransmissionScheduler,
};
