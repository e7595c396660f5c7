//! # Outbound Ports
//!
//! Read access to the contract that publishes configurations.

use async_trait::async_trait;
use shared_types::{ChainError, ConfigDigest, ContractConfig};

/// Where and what the latest configuration change is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigDetails {
    /// Block in which the configuration was last set.
    pub changed_in_block: u64,
    /// Digest of the latest configuration.
    pub config_digest: ConfigDigest,
}

/// The configuration contract, as seen through a chain client.
#[async_trait]
pub trait ContractConfigTracker: Send + Sync {
    /// Current chain height.
    async fn latest_block_height(&self) -> Result<u64, ChainError>;

    /// Block and digest of the most recent configuration change.
    async fn latest_config_details(&self) -> Result<ConfigDetails, ChainError>;

    /// Full configuration from the "config set" log emitted in `changed_in_block`.
    async fn config_from_logs(&self, changed_in_block: u64) -> Result<ContractConfig, ChainError>;

    /// Push notifications of new configurations.
    async fn subscribe_to_new_configs(
        &self,
    ) -> Result<Box<dyn ContractConfigSubscription>, ChainError>;
}

/// A live push subscription.
#[async_trait]
pub trait ContractConfigSubscription: Send {
    /// Next notification, or `None` once the subscription has ended.
    async fn next(&mut self) -> Option<ContractConfig>;

    /// End the subscription. Idempotent.
    fn close(&mut self);
}
