//! # Ports
//!
//! Outbound: the node's own key material.

pub mod outbound;

pub use outbound::PrivateKeys;
