//! # Adapter Implementations
//!
//! Concrete implementations of outbound ports that live outside the
//! subsystem crates. Subsystem-local test doubles (in-memory contract,
//! network hub, aggregator) stay in their own crates.

pub mod storage;

pub use storage::*;
