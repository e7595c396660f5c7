//! # Domain Errors

use ocr_01_config::{ConfigError, DerivationError};
use ocr_03_message_router::NetworkError;
use thiserror::Error;

/// Why a configuration could not be put into service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SupervisorError {
    /// The configuration, its secret or our identity in it is unusable.
    #[error(transparent)]
    Derivation(#[from] DerivationError),

    /// The public part of the configuration is unusable (bootstrap nodes).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The network endpoint or bootstrapper could not be brought up.
    #[error("Network setup failed: {0}")]
    Network(#[from] NetworkError),
}

impl SupervisorError {
    /// Whether this node simply does not take part in the configuration.
    pub fn is_identity(&self) -> bool {
        matches!(self, SupervisorError::Derivation(DerivationError::Identity(_)))
    }
}
