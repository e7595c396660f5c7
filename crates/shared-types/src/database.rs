//! # Durable Store Port
//!
//! Driven port for the node's durable state: the last adopted configuration
//! and this node's pending transmissions.
//!
//! Production: `RocksDbDatabase` in node-runtime (feature `rocksdb`).
//! Testing: [`InMemoryDatabase`] (below).

use crate::entities::{ConfigDigest, ContractConfig, PendingTransmission, PendingTransmissionKey};
use crate::errors::PersistenceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Durable storage used by the supervisor and the transmission scheduler.
///
/// Implementations must be safe to call concurrently; callers never share a
/// record, so no cross-call transactions are required.
#[async_trait]
pub trait Database: Send + Sync {
    /// Last persisted configuration, if any.
    async fn read_config(&self) -> Result<Option<ContractConfig>, PersistenceError>;

    /// Replace the persisted configuration.
    async fn write_config(&self, config: &ContractConfig) -> Result<(), PersistenceError>;

    /// Insert or overwrite a pending transmission.
    async fn store_pending_transmission(
        &self,
        key: &PendingTransmissionKey,
        transmission: &PendingTransmission,
    ) -> Result<(), PersistenceError>;

    /// Remove a pending transmission. Removing a missing key is not an error.
    async fn delete_pending_transmission(
        &self,
        key: &PendingTransmissionKey,
    ) -> Result<(), PersistenceError>;

    /// All pending transmissions recorded under `config_digest`.
    async fn pending_transmissions_with_config_digest(
        &self,
        config_digest: ConfigDigest,
    ) -> Result<BTreeMap<PendingTransmissionKey, PendingTransmission>, PersistenceError>;

    /// Remove every pending transmission scheduled before `cutoff`, across all
    /// configurations. Returns the number of removed records.
    async fn delete_pending_transmissions_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, PersistenceError>;
}

#[derive(Default)]
struct InMemoryState {
    config: Option<ContractConfig>,
    pending: BTreeMap<PendingTransmissionKey, PendingTransmission>,
}

/// In-memory [`Database`] for tests and development nodes.
///
/// Writes can be made to fail on demand to exercise best-effort paths.
#[derive(Default)]
pub struct InMemoryDatabase {
    state: Mutex<InMemoryState>,
    fail_writes: AtomicBool,
}

impl InMemoryDatabase {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of pending transmissions across all configurations.
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    fn check_writable(&self) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::WriteFailed("injected write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn read_config(&self) -> Result<Option<ContractConfig>, PersistenceError> {
        Ok(self.state.lock().config.clone())
    }

    async fn write_config(&self, config: &ContractConfig) -> Result<(), PersistenceError> {
        self.check_writable()?;
        self.state.lock().config = Some(config.clone());
        Ok(())
    }

    async fn store_pending_transmission(
        &self,
        key: &PendingTransmissionKey,
        transmission: &PendingTransmission,
    ) -> Result<(), PersistenceError> {
        self.check_writable()?;
        self.state.lock().pending.insert(*key, transmission.clone());
        Ok(())
    }

    async fn delete_pending_transmission(
        &self,
        key: &PendingTransmissionKey,
    ) -> Result<(), PersistenceError> {
        self.check_writable()?;
        self.state.lock().pending.remove(key);
        Ok(())
    }

    async fn pending_transmissions_with_config_digest(
        &self,
        config_digest: ConfigDigest,
    ) -> Result<BTreeMap<PendingTransmissionKey, PendingTransmission>, PersistenceError> {
        Ok(self
            .state
            .lock()
            .pending
            .iter()
            .filter(|(key, _)| key.config_digest == config_digest)
            .map(|(key, value)| (*key, value.clone()))
            .collect())
    }

    async fn delete_pending_transmissions_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, PersistenceError> {
        self.check_writable()?;
        let mut state = self.state.lock();
        let before = state.pending.len();
        state.pending.retain(|_, transmission| transmission.time >= cutoff);
        Ok(before - state.pending.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EpochRound;

    fn record(time: DateTime<Utc>) -> PendingTransmission {
        PendingTransmission {
            time,
            median: 1,
            serialized_report: vec![],
            rs: vec![],
            ss: vec![],
            vs: [0u8; 32],
        }
    }

    #[tokio::test]
    async fn test_pending_filtered_by_digest() {
        let db = InMemoryDatabase::new();
        let now = Utc::now();
        let a = PendingTransmissionKey::new(ConfigDigest([1; 32]), EpochRound::new(1, 1));
        let b = PendingTransmissionKey::new(ConfigDigest([2; 32]), EpochRound::new(1, 1));
        db.store_pending_transmission(&a, &record(now)).await.unwrap();
        db.store_pending_transmission(&b, &record(now)).await.unwrap();

        let only_a = db
            .pending_transmissions_with_config_digest(ConfigDigest([1; 32]))
            .await
            .unwrap();
        assert_eq!(only_a.len(), 1);
        assert!(only_a.contains_key(&a));
    }

    #[tokio::test]
    async fn test_delete_older_than() {
        let db = InMemoryDatabase::new();
        let now = Utc::now();
        let digest = ConfigDigest([1; 32]);
        let old = PendingTransmissionKey::new(digest, EpochRound::new(1, 1));
        let fresh = PendingTransmissionKey::new(digest, EpochRound::new(1, 2));
        db.store_pending_transmission(&old, &record(now - chrono::Duration::hours(25)))
            .await
            .unwrap();
        db.store_pending_transmission(&fresh, &record(now)).await.unwrap();

        let removed = db
            .delete_pending_transmissions_older_than(now - chrono::Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(db.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let db = InMemoryDatabase::new();
        db.set_fail_writes(true);
        let config = ContractConfig {
            config_digest: ConfigDigest([9; 32]),
            signers: vec![],
            transmitters: vec![],
            threshold: 0,
            encoded_config_version: 1,
            encoded: vec![],
        };
        assert!(matches!(
            db.write_config(&config).await,
            Err(PersistenceError::WriteFailed(_))
        ));
        assert_eq!(db.read_config().await.unwrap(), None);
    }
}
