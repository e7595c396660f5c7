//! # Shared Types Crate
//!
//! Entities and driven ports shared by all reporting subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `ConfigDigest`, `EpochRound` and the
//!   pending-transmission record are defined once, here.
//! - **Per-record ownership**: the durable store is the only resource touched
//!   by more than one subsystem. The supervisor owns the configuration record,
//!   the transmission scheduler owns pending-transmission records.
//! - **Bounded external calls**: every call into a chain, database or network
//!   goes through [`task::bounded`] so a hung dependency cannot block shutdown.

pub mod database;
pub mod entities;
pub mod errors;
pub mod task;
pub mod time;

pub use database::{Database, InMemoryDatabase};
pub use entities::*;
pub use errors::*;
pub use task::{bounded, bounded_call, Interrupted};
pub use time::{Clock, SystemClock, TokioClock};
