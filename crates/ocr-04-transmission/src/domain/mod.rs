//! # Domain Layer
//!
//! Transmission gate, deterministic staging and the pending queue.

pub mod deviation;
pub mod order;
pub mod queue;
pub mod report;

pub use deviation::{deviates, should_transmit, LatestScheduled};
pub use order::{permutation, stage_of, TransmissionSchedule};
pub use queue::{plan_recovery, PendingQueue, RecoveryPlan, ScheduledTransmission};
pub use report::{AttestedReport, TransmitEvent};
