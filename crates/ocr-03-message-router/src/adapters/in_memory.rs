//! # In-Memory Network
//!
//! A process-local hub standing in for the peer-to-peer stack. Endpoints
//! register under their configuration digest and peer id on `start`;
//! traffic only flows between endpoints of the same digest. Delivery is
//! lossy like the real network: messages to offline peers or full inboxes
//! are dropped.

use crate::domain::{BinaryMessageWithSender, NetworkError};
use crate::ports::{
    BinaryNetworkEndpoint, BinaryNetworkEndpointFactory, Bootstrapper, BootstrapperFactory,
    PeerGroup,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{ConfigDigest, OracleId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Inbox size of each in-memory endpoint.
pub const INBOX_CAPACITY: usize = 256;

type Inbox = mpsc::Sender<BinaryMessageWithSender>;

#[derive(Default)]
struct Hub {
    groups: HashMap<ConfigDigest, HashMap<String, Inbox>>,
    bootstrappers: usize,
    endpoints_created: usize,
}

/// Shared in-memory network.
#[derive(Clone, Default)]
pub struct InMemoryNetwork {
    hub: Arc<Mutex<Hub>>,
}

impl InMemoryNetwork {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Endpoint factory for the node with `peer_id`.
    pub fn endpoint_factory(&self, peer_id: impl Into<String>) -> InMemoryEndpointFactory {
        InMemoryEndpointFactory {
            hub: Arc::clone(&self.hub),
            peer_id: peer_id.into(),
        }
    }

    /// Bootstrapper factory on this network.
    pub fn bootstrapper_factory(&self) -> InMemoryBootstrapperFactory {
        InMemoryBootstrapperFactory {
            hub: Arc::clone(&self.hub),
        }
    }

    /// Started, not yet closed endpoints of `config_digest`.
    pub fn active_endpoints(&self, config_digest: &ConfigDigest) -> usize {
        self.hub
            .lock()
            .groups
            .get(config_digest)
            .map_or(0, HashMap::len)
    }

    /// Started, not yet closed bootstrappers.
    pub fn active_bootstrappers(&self) -> usize {
        self.hub.lock().bootstrappers
    }

    /// Endpoints ever created on this network.
    pub fn endpoints_created(&self) -> usize {
        self.hub.lock().endpoints_created
    }
}

/// [`BinaryNetworkEndpointFactory`] on an [`InMemoryNetwork`].
#[derive(Clone)]
pub struct InMemoryEndpointFactory {
    hub: Arc<Mutex<Hub>>,
    peer_id: String,
}

impl BinaryNetworkEndpointFactory for InMemoryEndpointFactory {
    fn make_endpoint(
        &self,
        group: &PeerGroup,
    ) -> Result<Arc<dyn BinaryNetworkEndpoint>, NetworkError> {
        let own_id = group
            .oracle_id_of(&self.peer_id)
            .ok_or_else(|| NetworkError::NotInPeerSet(self.peer_id.clone()))?;
        let (inbox, receiver) = mpsc::channel(INBOX_CAPACITY);
        self.hub.lock().endpoints_created += 1;
        Ok(Arc::new(InMemoryEndpoint {
            hub: Arc::clone(&self.hub),
            group: group.clone(),
            own_id,
            own_peer_id: self.peer_id.clone(),
            state: Mutex::new(EndpointState::Created {
                inbox,
                receiver: Some(receiver),
            }),
        }))
    }

    fn peer_id(&self) -> String {
        self.peer_id.clone()
    }
}

enum EndpointState {
    Created {
        inbox: Inbox,
        receiver: Option<mpsc::Receiver<BinaryMessageWithSender>>,
    },
    Started {
        receiver: Option<mpsc::Receiver<BinaryMessageWithSender>>,
    },
    Closed,
}

struct InMemoryEndpoint {
    hub: Arc<Mutex<Hub>>,
    group: PeerGroup,
    own_id: OracleId,
    own_peer_id: String,
    state: Mutex<EndpointState>,
}

impl InMemoryEndpoint {
    fn deliver(&self, payload: Vec<u8>, to: OracleId) -> Result<(), NetworkError> {
        if !matches!(*self.state.lock(), EndpointState::Started { .. }) {
            return Err(NetworkError::Closed);
        }
        let peer_id = self
            .group
            .peer_ids
            .get(to.index())
            .ok_or(NetworkError::UnknownDestination(to))?;
        let inbox = self
            .hub
            .lock()
            .groups
            .get(&self.group.config_digest)
            .and_then(|members| members.get(peer_id))
            .cloned();
        let Some(inbox) = inbox else {
            debug!(to = %to, "[ocr-03] Peer offline, message dropped");
            return Ok(());
        };
        let message = BinaryMessageWithSender {
            sender: self.own_id,
            payload,
        };
        if inbox.try_send(message).is_err() {
            debug!(to = %to, "[ocr-03] Peer inbox full, message dropped");
        }
        Ok(())
    }
}

#[async_trait]
impl BinaryNetworkEndpoint for InMemoryEndpoint {
    async fn start(&self) -> Result<(), NetworkError> {
        let mut state = self.state.lock();
        let (inbox, receiver) = match std::mem::replace(&mut *state, EndpointState::Closed) {
            EndpointState::Created { inbox, receiver } => (inbox, receiver),
            other => {
                *state = other;
                return Err(NetworkError::StartFailed("endpoint already started".to_string()));
            }
        };
        self.hub
            .lock()
            .groups
            .entry(self.group.config_digest)
            .or_default()
            .insert(self.own_peer_id.clone(), inbox);
        *state = EndpointState::Started { receiver };
        Ok(())
    }

    async fn close(&self) -> Result<(), NetworkError> {
        let mut state = self.state.lock();
        if matches!(*state, EndpointState::Closed) {
            return Ok(());
        }
        *state = EndpointState::Closed;
        let mut hub = self.hub.lock();
        if let Some(members) = hub.groups.get_mut(&self.group.config_digest) {
            members.remove(&self.own_peer_id);
            if members.is_empty() {
                hub.groups.remove(&self.group.config_digest);
            }
        }
        Ok(())
    }

    async fn send_to(&self, payload: Vec<u8>, to: OracleId) -> Result<(), NetworkError> {
        self.deliver(payload, to)
    }

    async fn broadcast(&self, payload: Vec<u8>) -> Result<(), NetworkError> {
        for index in 0..self.group.peer_ids.len() {
            self.deliver(payload.clone(), OracleId(index as u8))?;
        }
        Ok(())
    }

    fn take_receiver(&self) -> Result<mpsc::Receiver<BinaryMessageWithSender>, NetworkError> {
        match &mut *self.state.lock() {
            EndpointState::Created { receiver, .. } | EndpointState::Started { receiver } => {
                receiver.take().ok_or(NetworkError::ReceiverTaken)
            }
            EndpointState::Closed => Err(NetworkError::Closed),
        }
    }
}

/// [`BootstrapperFactory`] on an [`InMemoryNetwork`].
#[derive(Clone)]
pub struct InMemoryBootstrapperFactory {
    hub: Arc<Mutex<Hub>>,
}

impl BootstrapperFactory for InMemoryBootstrapperFactory {
    fn make_bootstrapper(&self, group: &PeerGroup) -> Result<Arc<dyn Bootstrapper>, NetworkError> {
        debug!(config_digest = %group.config_digest, "[ocr-03] Bootstrapper created");
        Ok(Arc::new(InMemoryBootstrapper {
            hub: Arc::clone(&self.hub),
            starts: AtomicUsize::new(0),
        }))
    }
}

struct InMemoryBootstrapper {
    hub: Arc<Mutex<Hub>>,
    starts: AtomicUsize,
}

#[async_trait]
impl Bootstrapper for InMemoryBootstrapper {
    async fn start(&self) -> Result<(), NetworkError> {
        if self.starts.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(NetworkError::StartFailed(
                "bootstrapper already started".to_string(),
            ));
        }
        self.hub.lock().bootstrappers += 1;
        Ok(())
    }

    async fn close(&self) -> Result<(), NetworkError> {
        if self.starts.swap(usize::MAX, Ordering::SeqCst) == 1 {
            self.hub.lock().bootstrappers -= 1;
        }
        Ok(())
    }
}
