//! # Service Layer

pub mod bootstrap;
pub mod config;
pub mod gc;
pub mod instance;
pub mod oracle;
pub(crate) mod persistence;

#[cfg(test)]
pub(crate) mod fixtures;

pub use bootstrap::{BootstrapDependencies, BootstrapSupervisor};
pub use config::SupervisorConfig;
pub use gc::GarbageCollector;
pub use instance::InstanceDependencies;
pub use oracle::{OracleDependencies, OracleSupervisor};
