//! # Supervisor State
//!
//! ```text
//! Idle ──adopt──▶ Running(d1) ──adopt──▶ Running(d2)
//!  ▲                  │                      │
//!  └──not in config───┘                      │
//!                                 cancel ────┴──▶ Terminated
//! ```

use shared_types::ConfigDigest;
use std::fmt;
use tokio::sync::watch;

/// Lifecycle state of a supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// No instance running.
    Idle,
    /// An instance runs the configuration with this digest.
    Running(ConfigDigest),
    /// Shut down for good.
    Terminated,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorState::Idle => write!(f, "idle"),
            SupervisorState::Running(digest) => write!(f, "running({digest})"),
            SupervisorState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Read-only view of a supervisor's state.
#[derive(Debug, Clone)]
pub struct SupervisorHandle {
    state: watch::Receiver<SupervisorState>,
}

impl SupervisorHandle {
    pub(crate) fn new(state: watch::Receiver<SupervisorState>) -> Self {
        Self { state }
    }

    /// Current state.
    pub fn state(&self) -> SupervisorState {
        *self.state.borrow()
    }

    /// Wait until the state satisfies `predicate`, returning that state.
    ///
    /// Returns the last state if the supervisor is dropped first.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&SupervisorState) -> bool,
    ) -> SupervisorState {
        if let Ok(state) = self.state.wait_for(|state| predicate(state)).await {
            return *state;
        }
        *self.state.borrow()
    }
}
