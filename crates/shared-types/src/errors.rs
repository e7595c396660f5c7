//! # Error Types
//!
//! Errors of external dependencies shared across subsystems. Both kinds are
//! logged and abandon the current operation; neither is ever escalated to a
//! process crash.

use crate::task::Interrupted;
use std::time::Duration;
use thiserror::Error;

/// Failure of a call into the blockchain (contract reads, transmissions).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    /// The call did not complete within its bound.
    #[error("Chain call timed out after {0:?}")]
    Timeout(Duration),

    /// The node or contract returned an error.
    #[error("Chain call failed: {0}")]
    CallFailed(String),

    /// The surrounding scope was cancelled.
    #[error("Chain call cancelled")]
    Cancelled,
}

impl From<Interrupted> for ChainError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::Timeout(after) => ChainError::Timeout(after),
            Interrupted::Cancelled => ChainError::Cancelled,
        }
    }
}

/// Failure of the durable store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    /// The store did not answer within its bound.
    #[error("Database call timed out after {0:?}")]
    Timeout(Duration),

    /// A write or delete failed.
    #[error("Database write failed: {0}")]
    WriteFailed(String),

    /// A read failed or returned undecodable data.
    #[error("Database read failed: {0}")]
    ReadFailed(String),

    /// The surrounding scope was cancelled.
    #[error("Database call cancelled")]
    Cancelled,
}

impl From<Interrupted> for PersistenceError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::Timeout(after) => PersistenceError::Timeout(after),
            Interrupted::Cancelled => PersistenceError::Cancelled,
        }
    }
}
