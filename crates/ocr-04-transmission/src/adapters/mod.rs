//! # Adapters Layer

pub mod in_memory;

pub use in_memory::{InMemoryAggregator, InMemoryTransmitter};
