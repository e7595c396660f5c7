//! # OCR-05 Supervisor
//!
//! Keeps exactly one protocol instance running for the current on-chain
//! configuration, swapping it out whenever the configuration changes.
//!
//! **Subsystem ID:** 5
//! **Architecture:** Hexagonal, single-owner actor
//!
//! ## Node Kinds
//!
//! | Supervisor | Runs per configuration | Extra duties |
//! |------------|------------------------|--------------|
//! | [`OracleSupervisor`] | endpoint, router, scheduler, reporting protocol | pending-transmission GC |
//! | [`BootstrapSupervisor`] | one bootstrapper | none |
//!
//! ## Startup
//!
//! 1. Restore the last persisted configuration (bounded, best effort).
//! 2. Adopt it without re-persisting.
//! 3. Start the config tracker from that digest.
//! 4. Adopt every emitted change: derive, tear down, start, persist.
//!
//! ## Module Structure
//!
//! ```text
//! ocr-05-supervisor/
//! ├── domain/      # SupervisorState, SupervisorError, GC jitter
//! ├── ports/       # ReportingProtocol, ProtocolInstance
//! ├── adapters/    # ExternalProtocol
//! └── service/     # OracleSupervisor, BootstrapSupervisor, GarbageCollector
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::ExternalProtocol;
pub use domain::{jittered_interval, GcConfig, SupervisorError, SupervisorHandle, SupervisorState};
pub use ports::{ProtocolInstance, ReportingProtocol};
pub use service::{
    BootstrapDependencies, BootstrapSupervisor, GarbageCollector, InstanceDependencies,
    OracleDependencies, OracleSupervisor, SupervisorConfig,
};
