//! # Outbound Ports (Driven Ports)
//!
//! The networking stack the router sits on. Endpoints move opaque bytes
//! between the oracles of one configuration; bootstrappers only help peers
//! of a configuration find each other.

use crate::domain::{BinaryMessageWithSender, NetworkError};
use async_trait::async_trait;
use shared_types::{ConfigDigest, OracleId};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The peers of one configuration, in oracle order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerGroup {
    /// Configuration the group belongs to. Endpoints of different digests never talk.
    pub config_digest: ConfigDigest,
    /// Peer id of each oracle, indexed by [`OracleId`].
    pub peer_ids: Vec<String>,
    /// Bootstrap node locators.
    pub bootstrappers: Vec<String>,
    /// Fault tolerance of the configuration.
    pub f: u8,
}

impl PeerGroup {
    /// Oracle index of `peer_id`, if it belongs to the group.
    pub fn oracle_id_of(&self, peer_id: &str) -> Option<OracleId> {
        self.peer_ids
            .iter()
            .position(|candidate| candidate == peer_id)
            .map(|index| OracleId(index as u8))
    }
}

/// Byte-level transport between the oracles of one configuration.
#[async_trait]
pub trait BinaryNetworkEndpoint: Send + Sync {
    /// Begin accepting and sending traffic.
    async fn start(&self) -> Result<(), NetworkError>;

    /// Stop; the inbound stream ends.
    async fn close(&self) -> Result<(), NetworkError>;

    /// Send to one oracle. Delivery is best-effort.
    async fn send_to(&self, payload: Vec<u8>, to: OracleId) -> Result<(), NetworkError>;

    /// Send to every oracle, ourselves included.
    async fn broadcast(&self, payload: Vec<u8>) -> Result<(), NetworkError>;

    /// Take the inbound stream. Succeeds once per endpoint.
    fn take_receiver(&self) -> Result<mpsc::Receiver<BinaryMessageWithSender>, NetworkError>;
}

/// Creates endpoints for this node's peer identity.
pub trait BinaryNetworkEndpointFactory: Send + Sync {
    /// Endpoint for `group`. Fails if our peer id is not a member.
    fn make_endpoint(&self, group: &PeerGroup)
        -> Result<Arc<dyn BinaryNetworkEndpoint>, NetworkError>;

    /// This node's peer id.
    fn peer_id(&self) -> String;
}

/// Discovery helper for one configuration.
#[async_trait]
pub trait Bootstrapper: Send + Sync {
    /// Begin serving.
    async fn start(&self) -> Result<(), NetworkError>;

    /// Stop serving.
    async fn close(&self) -> Result<(), NetworkError>;
}

/// Creates bootstrappers.
pub trait BootstrapperFactory: Send + Sync {
    /// Bootstrapper for `group`.
    fn make_bootstrapper(&self, group: &PeerGroup) -> Result<Arc<dyn Bootstrapper>, NetworkError>;
}
