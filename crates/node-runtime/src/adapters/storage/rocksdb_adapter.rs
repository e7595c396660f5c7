//! # RocksDB Storage Adapter
//!
//! Durable implementation of the [`Database`] port.
//!
//! ## Column Families
//!
//! - `config` - the last adopted contract configuration under one key
//! - `pending_transmissions` - key `digest ‖ epoch ‖ round` (big-endian), so
//!   a digest prefix scan yields one configuration's records in order
//!
//! Values are bincode-encoded. RocksDB calls block, so each one runs on the
//! blocking thread pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamily, ColumnFamilyDescriptor, DBCompressionType, Direction,
    IteratorMode, Options, WriteBatch, WriteOptions, DB,
};
use shared_types::{
    ConfigDigest, ContractConfig, Database, PendingTransmission, PendingTransmissionKey,
    PersistenceError,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Column family of the persisted configuration.
pub const CF_CONFIG: &str = "config";
/// Column family of pending transmissions.
pub const CF_PENDING_TRANSMISSIONS: &str = "pending_transmissions";

/// All column families used by the node
pub const COLUMN_FAMILIES: &[&str] = &[CF_CONFIG, CF_PENDING_TRANSMISSIONS];

const LATEST_CONFIG_KEY: &[u8] = b"latest";

/// RocksDB tuning.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: String,
    /// Block cache size in bytes (default: 8MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 4MB)
    pub write_buffer_size: usize,
    /// Maximum number of write buffers (default: 2)
    pub max_write_buffer_number: i32,
    /// Enable fsync after each write (default: true for durability)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/rocksdb".to_string(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            max_write_buffer_number: 2,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Create config for testing (no sync)
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sync_writes: false,
            ..Self::default()
        }
    }
}

/// RocksDB-backed [`Database`].
#[derive(Clone)]
pub struct RocksDbDatabase {
    db: Arc<DB>,
    sync_writes: bool,
}

impl RocksDbDatabase {
    /// Open or create the database.
    pub fn open(config: &RocksDbConfig) -> Result<Self, PersistenceError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_compression_type(DBCompressionType::Snappy);

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors)
            .map_err(|e| PersistenceError::ReadFailed(format!("Failed to open RocksDB: {e}")))?;

        Ok(Self {
            db: Arc::new(db),
            sync_writes: config.sync_writes,
        })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, PersistenceError>
    where
        T: Send + 'static,
        F: FnOnce(&DB) -> Result<T, PersistenceError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| PersistenceError::WriteFailed(format!("RocksDB task failed: {e}")))?
    }
}

fn write_options(sync: bool) -> WriteOptions {
    let mut write_opts = WriteOptions::default();
    write_opts.set_sync(sync);
    write_opts
}

fn column<'a>(db: &'a DB, name: &str) -> Result<&'a ColumnFamily, PersistenceError> {
    db.cf_handle(name)
        .ok_or_else(|| PersistenceError::ReadFailed(format!("Missing column family {name}")))
}

fn read_error(e: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::ReadFailed(e.to_string())
}

fn write_error(e: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::WriteFailed(e.to_string())
}

#[async_trait]
impl Database for RocksDbDatabase {
    async fn read_config(&self) -> Result<Option<ContractConfig>, PersistenceError> {
        self.blocking(|db| {
            let raw = db
                .get_cf(column(db, CF_CONFIG)?, LATEST_CONFIG_KEY)
                .map_err(read_error)?;
            raw.map(|bytes| bincode::deserialize(&bytes).map_err(read_error))
                .transpose()
        })
        .await
    }

    async fn write_config(&self, config: &ContractConfig) -> Result<(), PersistenceError> {
        let value = bincode::serialize(config).map_err(write_error)?;
        let sync = self.sync_writes;
        self.blocking(move |db| {
            db.put_cf_opt(column(db, CF_CONFIG)?, LATEST_CONFIG_KEY, value, &write_options(sync))
                .map_err(write_error)
        })
        .await
    }

    async fn store_pending_transmission(
        &self,
        key: &PendingTransmissionKey,
        transmission: &PendingTransmission,
    ) -> Result<(), PersistenceError> {
        let key = key.to_bytes();
        let value = bincode::serialize(transmission).map_err(write_error)?;
        let sync = self.sync_writes;
        self.blocking(move |db| {
            db.put_cf_opt(column(db, CF_PENDING_TRANSMISSIONS)?, key, value, &write_options(sync))
                .map_err(write_error)
        })
        .await
    }

    async fn delete_pending_transmission(
        &self,
        key: &PendingTransmissionKey,
    ) -> Result<(), PersistenceError> {
        let key = key.to_bytes();
        let sync = self.sync_writes;
        self.blocking(move |db| {
            db.delete_cf_opt(column(db, CF_PENDING_TRANSMISSIONS)?, key, &write_options(sync))
                .map_err(write_error)
        })
        .await
    }

    async fn pending_transmissions_with_config_digest(
        &self,
        config_digest: ConfigDigest,
    ) -> Result<BTreeMap<PendingTransmissionKey, PendingTransmission>, PersistenceError> {
        self.blocking(move |db| {
            let prefix: &[u8] = config_digest.as_bytes();
            let mut records = BTreeMap::new();
            let iter = db.iterator_cf(
                column(db, CF_PENDING_TRANSMISSIONS)?,
                IteratorMode::From(prefix, Direction::Forward),
            );
            for item in iter {
                let (key, value) = item.map_err(read_error)?;
                if !key.starts_with(prefix) {
                    break;
                }
                let Some(key) = PendingTransmissionKey::from_bytes(&key) else {
                    warn!(len = key.len(), "[node] Skipping malformed pending transmission key");
                    continue;
                };
                let transmission = bincode::deserialize(&value).map_err(read_error)?;
                records.insert(key, transmission);
            }
            Ok(records)
        })
        .await
    }

    async fn delete_pending_transmissions_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, PersistenceError> {
        let sync = self.sync_writes;
        self.blocking(move |db| {
            let cf = column(db, CF_PENDING_TRANSMISSIONS)?;
            let mut batch = WriteBatch::default();
            let mut removed = 0;
            for item in db.iterator_cf(cf, IteratorMode::Start) {
                let (key, value) = item.map_err(read_error)?;
                match bincode::deserialize::<PendingTransmission>(&value) {
                    Ok(transmission) if transmission.time < cutoff => {
                        batch.delete_cf(cf, &key);
                        removed += 1;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "[node] Skipping undecodable pending transmission");
                    }
                }
            }
            db.write_opt(batch, &write_options(sync)).map_err(write_error)?;
            Ok(removed)
        })
        .await
    }
}
