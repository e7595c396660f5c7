//! # Domain Errors

use shared_types::{Interrupted, OracleId};
use std::time::Duration;
use thiserror::Error;

/// Network endpoint failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// The endpoint could not be created or started.
    #[error("Endpoint start failed: {0}")]
    StartFailed(String),

    /// The endpoint is closed (or was never started).
    #[error("Endpoint closed")]
    Closed,

    /// The destination is not part of this endpoint's peer set.
    #[error("Unknown destination oracle {0}")]
    UnknownDestination(OracleId),

    /// Our own peer id is not in the peer set.
    #[error("Own peer id {0} not in peer set")]
    NotInPeerSet(String),

    /// The inbound stream was already taken.
    #[error("Inbound stream already taken")]
    ReceiverTaken,

    /// A message could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// An open/close call did not complete in time.
    #[error("Network call timed out after {0:?}")]
    Timeout(Duration),

    /// The surrounding scope was cancelled.
    #[error("Network call cancelled")]
    Cancelled,
}

impl From<Interrupted> for NetworkError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::Timeout(after) => NetworkError::Timeout(after),
            Interrupted::Cancelled => NetworkError::Cancelled,
        }
    }
}
