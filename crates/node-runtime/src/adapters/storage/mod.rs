//! # Production Storage Adapters
//!
//! Enable the `rocksdb` feature to use the durable store:
//!
//! ```toml
//! node-runtime = { path = "...", features = ["rocksdb"] }
//! ```
//!
//! Without it only [`InMemoryDatabase`] is available, which loses pending
//! transmissions on restart.

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{
    RocksDbConfig, RocksDbDatabase, CF_CONFIG, CF_PENDING_TRANSMISSIONS, COLUMN_FAMILIES,
};

// Re-export the in-memory store for development and tests
pub use shared_types::InMemoryDatabase;
