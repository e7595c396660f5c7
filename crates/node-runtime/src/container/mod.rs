//! # Node Container
//!
//! Configuration and assembly of a node. A node runs exactly one
//! supervisor; which one depends on its role.

pub mod config;
pub mod node;

pub use config::{ConfigValidationError, NodeConfig, StorageConfig};
pub use node::{open_database, NodeRole, OracleNode};
