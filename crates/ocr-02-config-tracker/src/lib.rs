//! # OCR-02 Config Tracker
//!
//! Follows the configuration contract and emits each new configuration once
//! it is buried under enough blocks.
//!
//! **Subsystem ID:** 2
//! **Architecture:** Hexagonal, single tokio task
//!
//! ## Behaviour
//!
//! - Polls immediately on start, then every `poll_interval`; while a change
//!   awaits confirmation the interval shrinks to at most 15s.
//! - A push subscription triggers immediate polls; when it ends it is
//!   reopened after `resubscribe_interval`.
//! - Confirmed configurations whose encoded version this node cannot
//!   interpret are dropped with an `unsupported_config_version` alert.
//! - Emission goes to a bounded queue (capacity 5) and yields to
//!   cancellation.
//!
//! ## Module Structure
//!
//! ```text
//! ocr-02-config-tracker/
//! ├── domain/      # decide(), next_poll_delay()
//! ├── ports/       # ContractConfigTracker, ContractConfigSubscription
//! ├── adapters/    # InMemoryConfigContract
//! └── service.rs   # ConfigTracker actor
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::InMemoryConfigContract;
pub use domain::{decide, next_poll_delay, PollDecision};
pub use ports::{ConfigDetails, ContractConfigSubscription, ContractConfigTracker};
pub use service::{ConfigTracker, PollOutcome, TrackerConfig};
