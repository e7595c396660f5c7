//! # Adapters
//!
//! Simulated configuration contract.

pub mod in_memory;

pub use in_memory::InMemoryConfigContract;
