//! # OCR-03 Message Router
//!
//! Epoch-aware routing of protocol messages between the network and the
//! leader-election and report-generation phases of one protocol instance.
//!
//! **Subsystem ID:** 3
//! **Architecture:** Hexagonal, single-owner actor
//!
//! ## Data Flow
//!
//! ```text
//! BinaryNetworkEndpoint ──bytes──▶ InboundDecoder ──▶ MessageRouter
//!                                                       │        │
//!                                     LeaderElection ◀──┘        └──▶ ReportGeneration
//!                                                                     (epoch-gated)
//! ```
//!
//! ## Routing Rules
//!
//! | Message | Epoch vs current | Action |
//! |---------|------------------|--------|
//! | Leader election | any | forward |
//! | Report generation | older | drop |
//! | Report generation | equal | forward |
//! | Report generation | newer | buffer per sender (oldest evicted when full) |
//!
//! On an epoch change to `E > current`, buffered messages of epoch `E` are
//! replayed in sender order before anything received afterwards.
//!
//! ## Module Structure
//!
//! ```text
//! ocr-03-message-router/
//! ├── domain/      # messages, MessageBuffer, EpochRouter, NetworkError
//! ├── ports/       # BinaryNetworkEndpoint(+Factory), Bootstrapper(+Factory)
//! ├── adapters/    # SerializingEndpoint, InMemoryNetwork
//! └── service.rs   # MessageRouter actor
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    decode_message, encode_message, InMemoryBootstrapperFactory, InMemoryEndpointFactory,
    InMemoryNetwork, InboundDecoder, NetworkSender, SerializingEndpoint, MAX_MESSAGE_SIZE,
};
pub use domain::{
    Admission, BinaryMessageWithSender, DropReason, EpochChange, EpochRouter,
    LeaderElectionMessage, MessageBuffer, MessageWithSender, NetworkError, ProtocolMessage,
    Replay, ReportGenerationEvent, ReportGenerationKind, ReportGenerationMessage,
};
pub use ports::{
    BinaryNetworkEndpoint, BinaryNetworkEndpointFactory, Bootstrapper, BootstrapperFactory,
    PeerGroup,
};
pub use service::{MessageRouter, RouterConfig, RouterHandles};
