//! # Ports
//!
//! Outbound: the configuration contract.

pub mod outbound;

pub use outbound::{ConfigDetails, ContractConfigSubscription, ContractConfigTracker};
