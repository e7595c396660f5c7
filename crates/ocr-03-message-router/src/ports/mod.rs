//! # Ports Layer
//!
//! Driven ports: the peer-to-peer networking stack.

pub mod outbound;

pub use outbound::{
    BinaryNetworkEndpoint, BinaryNetworkEndpointFactory, Bootstrapper, BootstrapperFactory,
    PeerGroup,
};
