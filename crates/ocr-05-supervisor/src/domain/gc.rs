//! # Garbage Collection Schedule

use rand::Rng;
use std::time::Duration;

/// Garbage collection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GcConfig {
    /// Base delay between collections.
    pub base_interval: Duration,
    /// Largest extra delay, as a fraction of `base_interval`.
    pub max_jitter: f64,
    /// Pending transmissions older than this are deleted.
    pub retention: Duration,
    /// Bound on each database call.
    pub database_timeout: Duration,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(10 * 60),
            max_jitter: 0.1,
            retention: Duration::from_secs(24 * 60 * 60),
            database_timeout: Duration::from_secs(10),
        }
    }
}

/// `base` plus a uniformly drawn extra of up to `max_jitter * base`.
pub fn jittered_interval<R: Rng + ?Sized>(base: Duration, max_jitter: f64, rng: &mut R) -> Duration {
    if !max_jitter.is_finite() || max_jitter <= 0.0 {
        return base;
    }
    let extra = base.mul_f64(rng.gen_range(0.0..max_jitter.min(1.0)));
    base + extra
}
