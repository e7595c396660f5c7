//! # Node Runtime Library
//!
//! Assembles an OCR node: configuration from the environment, logging,
//! the durable store and the supervisor for the node's role.
//!
//! ## Startup Sequence
//!
//! ```rust,ignore
//! let config = NodeConfig::from_env()?;
//! telemetry::init_logging(&config.logging)?;
//! let database = open_database(&config)?;
//! let node = OracleNode::start(&config, NodeRole::Oracle(deps))?;
//! node.run_until_shutdown().await?;
//! ```
//!
//! Chain, network and key adapters are supplied by the embedding process;
//! this crate only wires them to the subsystems.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod container;
pub mod telemetry;

// Re-exports
pub use container::{
    open_database, ConfigValidationError, NodeConfig, NodeRole, OracleNode, StorageConfig,
};
pub use telemetry::{init_logging, LoggingConfig, TelemetryError};
