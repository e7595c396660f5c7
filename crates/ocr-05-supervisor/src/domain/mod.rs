//! # Domain Layer

pub mod errors;
pub mod gc;
pub mod state;

pub use errors::SupervisorError;
pub use gc::{jittered_interval, GcConfig};
pub use state::{SupervisorHandle, SupervisorState};
