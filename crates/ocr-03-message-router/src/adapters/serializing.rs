//! # Serializing Endpoint
//!
//! Wraps a [`BinaryNetworkEndpoint`] with the bincode wire form of
//! [`ProtocolMessage`]. Inbound bytes that do not decode, or that claim a
//! sender outside the configuration, are logged and dropped.

use crate::domain::{BinaryMessageWithSender, MessageWithSender, NetworkError, ProtocolMessage};
use crate::ports::BinaryNetworkEndpoint;
use shared_types::OracleId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Largest inbound payload accepted for decoding.
pub const MAX_MESSAGE_SIZE: usize = 128 * 1024;

/// Encode a message in its wire form.
pub fn encode_message(message: &ProtocolMessage) -> Result<Vec<u8>, NetworkError> {
    bincode::serialize(message).map_err(|e| NetworkError::Serialization(e.to_string()))
}

/// Decode a message from its wire form.
pub fn decode_message(payload: &[u8]) -> Result<ProtocolMessage, NetworkError> {
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(NetworkError::Serialization(format!(
            "payload of {} bytes exceeds {MAX_MESSAGE_SIZE}",
            payload.len()
        )));
    }
    bincode::deserialize(payload).map_err(|e| NetworkError::Serialization(e.to_string()))
}

/// Typed view over a byte endpoint for a configuration with `n` oracles.
#[derive(Clone)]
pub struct SerializingEndpoint {
    inner: Arc<dyn BinaryNetworkEndpoint>,
    n: usize,
}

impl SerializingEndpoint {
    /// Wrap `inner`.
    pub fn new(inner: Arc<dyn BinaryNetworkEndpoint>, n: usize) -> Self {
        Self { inner, n }
    }

    /// Start the underlying endpoint.
    pub async fn start(&self) -> Result<(), NetworkError> {
        self.inner.start().await
    }

    /// Close the underlying endpoint.
    pub async fn close(&self) -> Result<(), NetworkError> {
        self.inner.close().await
    }

    /// Handle for sending typed messages.
    pub fn sender(&self) -> NetworkSender {
        NetworkSender {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Take the decoded inbound stream.
    pub fn take_inbound(&self) -> Result<InboundDecoder, NetworkError> {
        Ok(InboundDecoder {
            binary: self.inner.take_receiver()?,
            n: self.n,
        })
    }
}

/// Typed send half, cloneable into protocol tasks.
#[derive(Clone)]
pub struct NetworkSender {
    inner: Arc<dyn BinaryNetworkEndpoint>,
}

impl NetworkSender {
    /// Send `message` to one oracle.
    pub async fn send_to(&self, message: &ProtocolMessage, to: OracleId) -> Result<(), NetworkError> {
        self.inner.send_to(encode_message(message)?, to).await
    }

    /// Send `message` to every oracle.
    pub async fn broadcast(&self, message: &ProtocolMessage) -> Result<(), NetworkError> {
        self.inner.broadcast(encode_message(message)?).await
    }
}

/// Decoding receive half.
pub struct InboundDecoder {
    binary: mpsc::Receiver<BinaryMessageWithSender>,
    n: usize,
}

impl InboundDecoder {
    /// Next valid message; `None` once the endpoint is closed.
    pub async fn recv(&mut self) -> Option<MessageWithSender> {
        loop {
            let raw = self.binary.recv().await?;
            if raw.sender.index() >= self.n {
                warn!(
                    sender = %raw.sender,
                    n = self.n,
                    "[ocr-03] Dropping message from sender outside configuration"
                );
                continue;
            }
            match decode_message(&raw.payload) {
                Ok(message) => {
                    return Some(MessageWithSender {
                        sender: raw.sender,
                        message,
                    })
                }
                Err(e) => {
                    warn!(sender = %raw.sender, error = %e, "[ocr-03] Dropping undecodable message");
                }
            }
        }
    }

    /// Forward decoded messages into `sink` until the endpoint closes, the
    /// sink goes away or `cancel` fires.
    pub async fn run(mut self, sink: mpsc::Sender<MessageWithSender>, cancel: CancellationToken) {
        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => break,
                message = self.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                sent = sink.send(message) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("[ocr-03] Inbound decoder stopped");
    }
}
