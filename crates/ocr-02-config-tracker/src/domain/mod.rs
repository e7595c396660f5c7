//! # Domain Module
//!
//! Poll decisions, independent of timers and I/O.

pub mod decision;

pub use decision::{decide, next_poll_delay, PollDecision, AWAITING_CONFIRMATION_POLL_CAP};
