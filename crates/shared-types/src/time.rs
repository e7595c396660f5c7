//! # Clock Port
//!
//! Wall-clock source for persisted schedule times. Production uses
//! [`SystemClock`]; [`TokioClock`] follows tokio's (pausable) clock so timer
//! logic can be driven deterministically.

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// The operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall clock anchored to a tokio [`Instant`].
///
/// Advances exactly as far as tokio time advances, including under
/// `tokio::time::pause()`.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    anchor_wall: DateTime<Utc>,
    anchor_instant: Instant,
}

impl TokioClock {
    /// Anchor at the given wall-clock time.
    pub fn starting_at(anchor_wall: DateTime<Utc>) -> Self {
        Self {
            anchor_wall,
            anchor_instant: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::starting_at(Utc::now())
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = Instant::now().saturating_duration_since(self.anchor_instant);
        let elapsed = chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero());
        self.anchor_wall + elapsed
    }
}
