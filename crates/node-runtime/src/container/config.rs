//! # Node Configuration
//!
//! Unified configuration for all subsystems, loaded from `OCR_*`
//! environment variables on top of defaults.
//!
//! | Variable | Default | Applies to |
//! |----------|---------|------------|
//! | `OCR_LOG_LEVEL` | `info` | log filter |
//! | `OCR_LOG_JSON` | `false` | JSON log lines |
//! | `OCR_DATA_DIR` | `./data` | RocksDB directory |
//! | `OCR_POLL_INTERVAL_SECS` | `15` | config tracker |
//! | `OCR_RESUBSCRIBE_INTERVAL_SECS` | `120` | config tracker |
//! | `OCR_CONFIRMATIONS` | `3` | config tracker |
//! | `OCR_SKIP_CONFIRMATIONS` | `false` | config tracker |
//! | `OCR_BLOCKCHAIN_TIMEOUT_SECS` | `20` | tracker, transmission |
//! | `OCR_DATABASE_TIMEOUT_SECS` | `10` | supervisor, transmission, GC |
//! | `OCR_CONFIG_RESTORE_TIMEOUT_SECS` | `10` | supervisor startup |
//! | `OCR_NETWORK_TIMEOUT_SECS` | `20` | endpoints, bootstrappers |
//! | `OCR_BOOTSTRAPPERS` | empty | comma-separated locators |
//! | `OCR_GC_INTERVAL_SECS` | `600` | pending-transmission GC |
//! | `OCR_GC_RETENTION_SECS` | `86400` | pending-transmission GC |

use crate::telemetry::LoggingConfig;
use ocr_05_supervisor::SupervisorConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Supervisor and subsystem configuration.
    pub supervisor: SupervisorConfig,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// An environment variable could not be parsed.
    #[error("{key}={value:?} is not a valid value")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
    },

    /// A duration that must be positive is zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// A capacity that must be positive is zero.
    #[error("{0} must be greater than zero")]
    ZeroCapacity(&'static str),

    /// Confirmations are required but set to zero.
    #[error("Confirmations must be at least 1 unless skipped")]
    NoConfirmations,

    /// GC jitter outside `[0, 1)`.
    #[error("GC jitter must be in [0, 1), got {0}")]
    InvalidJitter(String),
}

impl NodeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any variable source, on top of defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let env = Lookup(lookup);

        if let Some(level) = env.get("OCR_LOG_LEVEL") {
            config.logging.level = level;
        }
        env.parse("OCR_LOG_JSON", &mut config.logging.json)?;
        if let Some(dir) = env.get("OCR_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }

        let supervisor = &mut config.supervisor;
        env.secs("OCR_POLL_INTERVAL_SECS", &mut supervisor.tracker.poll_interval)?;
        env.secs(
            "OCR_RESUBSCRIBE_INTERVAL_SECS",
            &mut supervisor.tracker.resubscribe_interval,
        )?;
        env.parse("OCR_CONFIRMATIONS", &mut supervisor.tracker.confirmations)?;
        env.parse("OCR_SKIP_CONFIRMATIONS", &mut supervisor.tracker.skip_confirmations)?;

        let mut blockchain_timeout = supervisor.tracker.blockchain_timeout;
        env.secs("OCR_BLOCKCHAIN_TIMEOUT_SECS", &mut blockchain_timeout)?;
        supervisor.tracker.blockchain_timeout = blockchain_timeout;
        supervisor.transmission.blockchain_timeout = blockchain_timeout;

        let mut database_timeout = supervisor.database_timeout;
        env.secs("OCR_DATABASE_TIMEOUT_SECS", &mut database_timeout)?;
        supervisor.database_timeout = database_timeout;
        supervisor.transmission.database_timeout = database_timeout;
        supervisor.gc.database_timeout = database_timeout;

        env.secs(
            "OCR_CONFIG_RESTORE_TIMEOUT_SECS",
            &mut supervisor.config_restore_timeout,
        )?;
        env.secs("OCR_NETWORK_TIMEOUT_SECS", &mut supervisor.network_timeout)?;
        if let Some(list) = env.get("OCR_BOOTSTRAPPERS") {
            supervisor.bootstrappers = list
                .split(',')
                .map(str::trim)
                .filter(|locator| !locator.is_empty())
                .map(String::from)
                .collect();
        }
        env.secs("OCR_GC_INTERVAL_SECS", &mut supervisor.gc.base_interval)?;
        env.secs("OCR_GC_RETENTION_SECS", &mut supervisor.gc.retention)?;

        Ok(config)
    }

    /// Check the configuration for values the subsystems cannot run with.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let supervisor = &self.supervisor;
        let durations = [
            ("poll interval", supervisor.tracker.poll_interval),
            ("resubscribe interval", supervisor.tracker.resubscribe_interval),
            ("blockchain timeout", supervisor.tracker.blockchain_timeout),
            ("database timeout", supervisor.database_timeout),
            ("config restore timeout", supervisor.config_restore_timeout),
            ("network timeout", supervisor.network_timeout),
            ("GC interval", supervisor.gc.base_interval),
            ("GC retention", supervisor.gc.retention),
        ];
        for (name, value) in durations {
            if value.is_zero() {
                return Err(ConfigValidationError::ZeroDuration(name));
            }
        }

        let capacities = [
            ("tracker emission queue", supervisor.tracker.emission_capacity),
            ("per-sender buffer", supervisor.router.per_sender_buffer_capacity),
            ("router queue", supervisor.router.queue_capacity),
            ("transmission queue", supervisor.transmission.event_queue_capacity),
        ];
        for (name, value) in capacities {
            if value == 0 {
                return Err(ConfigValidationError::ZeroCapacity(name));
            }
        }

        if supervisor.tracker.confirmations == 0 && !supervisor.tracker.skip_confirmations {
            return Err(ConfigValidationError::NoConfirmations);
        }
        let jitter = supervisor.gc.max_jitter;
        if !(0.0..1.0).contains(&jitter) {
            return Err(ConfigValidationError::InvalidJitter(jitter.to_string()));
        }
        Ok(())
    }
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory of the RocksDB database.
    pub data_dir: PathBuf,
    /// fsync every write.
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            sync_writes: true,
        }
    }
}

struct Lookup<F>(F);

impl<F: Fn(&str) -> Option<String>> Lookup<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn parse<T: FromStr>(&self, key: &'static str, target: &mut T) -> Result<(), ConfigValidationError> {
        if let Some(raw) = self.get(key) {
            *target = raw
                .trim()
                .parse()
                .map_err(|_| ConfigValidationError::InvalidValue { key, value: raw })?;
        }
        Ok(())
    }

    fn secs(&self, key: &'static str, target: &mut Duration) -> Result<(), ConfigValidationError> {
        let mut secs = target.as_secs();
        self.parse(key, &mut secs)?;
        *target = Duration::from_secs(secs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<NodeConfig, ConfigValidationError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NodeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.supervisor.tracker.poll_interval, Duration::from_secs(15));
        assert_eq!(config.supervisor.tracker.confirmations, 3);
        assert_eq!(config.supervisor.gc.retention, Duration::from_secs(86_400));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_defaults() {
        let config = load(&[
            ("OCR_LOG_LEVEL", "debug"),
            ("OCR_LOG_JSON", "true"),
            ("OCR_CONFIRMATIONS", "12"),
            ("OCR_BLOCKCHAIN_TIMEOUT_SECS", "5"),
            ("OCR_DATABASE_TIMEOUT_SECS", "3"),
            ("OCR_BOOTSTRAPPERS", "boot-a@10.0.0.1:4001, boot-b@10.0.0.2:4001,"),
        ])
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.supervisor.tracker.confirmations, 12);
        assert_eq!(config.supervisor.tracker.blockchain_timeout, Duration::from_secs(5));
        assert_eq!(
            config.supervisor.transmission.blockchain_timeout,
            Duration::from_secs(5)
        );
        assert_eq!(config.supervisor.gc.database_timeout, Duration::from_secs(3));
        assert_eq!(
            config.supervisor.bootstrappers,
            vec!["boot-a@10.0.0.1:4001", "boot-b@10.0.0.2:4001"]
        );
    }

    #[test]
    fn test_unparsable_value_is_rejected() {
        let err = load(&[("OCR_CONFIRMATIONS", "many")]).unwrap_err();
        assert_eq!(
            err,
            ConfigValidationError::InvalidValue {
                key: "OCR_CONFIRMATIONS",
                value: "many".into()
            }
        );
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let config = load(&[("OCR_POLL_INTERVAL_SECS", "0")]).unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::ZeroDuration("poll interval"))
        );
    }

    #[test]
    fn test_zero_confirmations_need_skip() {
        let config = load(&[("OCR_CONFIRMATIONS", "0")]).unwrap();
        assert_eq!(config.validate(), Err(ConfigValidationError::NoConfirmations));

        let config = load(&[("OCR_CONFIRMATIONS", "0"), ("OCR_SKIP_CONFIRMATIONS", "true")]).unwrap();
        assert!(config.validate().is_ok());
    }
}
