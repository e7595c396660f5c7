//! # Configuration Persistence
//!
//! Best-effort read and write of the last adopted configuration. Failures
//! are logged; the supervisor keeps running on what it has in memory.

use shared_types::{bounded_call, ContractConfig, Database, PersistenceError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Last persisted configuration, if it can be read in time.
pub(crate) async fn restore_config(
    database: &dyn Database,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Option<ContractConfig> {
    match bounded_call(cancel, timeout, database.read_config()).await {
        Ok(Some(config)) => {
            info!(config_digest = %config.config_digest, "[ocr-05] Restored persisted config");
            Some(config)
        }
        Ok(None) => None,
        Err(PersistenceError::Cancelled) => None,
        Err(e) => {
            warn!(error = %e, "[ocr-05] Could not restore persisted config");
            None
        }
    }
}

/// Persist `config`, logging on failure.
pub(crate) async fn persist_config(
    database: &dyn Database,
    config: &ContractConfig,
    timeout: Duration,
    cancel: &CancellationToken,
) {
    if let Err(e) = bounded_call(cancel, timeout, database.write_config(config)).await {
        warn!(
            config_digest = %config.config_digest,
            error = %e,
            "[ocr-05] Could not persist config, continuing with in-memory copy"
        );
    }
}
