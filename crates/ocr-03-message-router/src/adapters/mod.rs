//! # Adapters Layer
//!
//! - `serializing`: bincode wire form over any byte endpoint
//! - `in_memory`: process-local network for tests and single-host setups

pub mod in_memory;
pub mod serializing;

pub use in_memory::{InMemoryBootstrapperFactory, InMemoryEndpointFactory, InMemoryNetwork};
pub use serializing::{
    decode_message, encode_message, InboundDecoder, NetworkSender, SerializingEndpoint,
    MAX_MESSAGE_SIZE,
};
