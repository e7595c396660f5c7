//! # Supervisor Configuration

use crate::domain::GcConfig;
use ocr_02_config_tracker::TrackerConfig;
use ocr_03_message_router::RouterConfig;
use ocr_04_transmission::TransmissionConfig;
use std::time::Duration;

/// Settings for a supervisor and everything it starts.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Config tracker settings.
    pub tracker: TrackerConfig,
    /// Message router settings.
    pub router: RouterConfig,
    /// Transmission scheduler settings.
    pub transmission: TransmissionConfig,
    /// Pending-transmission garbage collection.
    pub gc: GcConfig,
    /// Bound on restoring the persisted configuration at startup.
    pub config_restore_timeout: Duration,
    /// Bound on other database calls.
    pub database_timeout: Duration,
    /// Bound on opening and closing network endpoints and bootstrappers.
    pub network_timeout: Duration,
    /// Bootstrap node locators handed to every endpoint.
    pub bootstrappers: Vec<String>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            router: RouterConfig::default(),
            transmission: TransmissionConfig::default(),
            gc: GcConfig::default(),
            config_restore_timeout: Duration::from_secs(10),
            database_timeout: Duration::from_secs(10),
            network_timeout: Duration::from_secs(20),
            bootstrappers: Vec::new(),
        }
    }
}
