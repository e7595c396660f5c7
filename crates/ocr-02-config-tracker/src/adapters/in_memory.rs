//! # In-Memory Configuration Contract
//!
//! Simulated chain for tests and development nodes: a block height, the
//! configurations published so far, and push subscribers.

use crate::ports::{ConfigDetails, ContractConfigSubscription, ContractConfigTracker};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{ChainError, ConfigDigest, ContractConfig};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc;

#[derive(Default)]
struct ChainState {
    height: u64,
    logs: BTreeMap<u64, ContractConfig>,
    latest: Option<ConfigDetails>,
    subscribers: Vec<mpsc::UnboundedSender<ContractConfig>>,
}

/// In-memory [`ContractConfigTracker`].
#[derive(Default)]
pub struct InMemoryConfigContract {
    state: Mutex<ChainState>,
    failing: AtomicBool,
    fetches: AtomicUsize,
    subscriptions: AtomicUsize,
}

impl InMemoryConfigContract {
    /// Create an unconfigured contract at height 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chain height.
    pub fn set_height(&self, height: u64) {
        self.state.lock().height = height;
    }

    /// Record a "config set" log in `block` and notify subscribers.
    pub fn publish(&self, config: ContractConfig, block: u64) {
        let mut state = self.state.lock();
        state.latest = Some(ConfigDetails {
            changed_in_block: block,
            config_digest: config.config_digest,
        });
        state.logs.insert(block, config.clone());
        state.height = state.height.max(block);
        state
            .subscribers
            .retain(|subscriber| subscriber.send(config.clone()).is_ok());
    }

    /// Make every call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// End all open subscriptions, as a dropped websocket would.
    pub fn drop_subscriptions(&self) {
        self.state.lock().subscribers.clear();
    }

    /// Number of `config_from_logs` calls served.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of subscriptions opened.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ChainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ChainError::CallFailed("injected chain failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContractConfigTracker for InMemoryConfigContract {
    async fn latest_block_height(&self) -> Result<u64, ChainError> {
        self.check()?;
        Ok(self.state.lock().height)
    }

    async fn latest_config_details(&self) -> Result<ConfigDetails, ChainError> {
        self.check()?;
        Ok(self.state.lock().latest.unwrap_or(ConfigDetails {
            changed_in_block: 0,
            config_digest: ConfigDigest::ZERO,
        }))
    }

    async fn config_from_logs(&self, changed_in_block: u64) -> Result<ContractConfig, ChainError> {
        self.check()?;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.state
            .lock()
            .logs
            .get(&changed_in_block)
            .cloned()
            .ok_or_else(|| ChainError::CallFailed(format!("no config log in block {changed_in_block}")))
    }

    async fn subscribe_to_new_configs(
        &self,
    ) -> Result<Box<dyn ContractConfigSubscription>, ChainError> {
        self.check()?;
        let (sender, receiver) = mpsc::unbounded_channel();
        self.state.lock().subscribers.push(sender);
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemorySubscription { receiver }))
    }
}

struct InMemorySubscription {
    receiver: mpsc::UnboundedReceiver<ContractConfig>,
}

#[async_trait]
impl ContractConfigSubscription for InMemorySubscription {
    async fn next(&mut self) -> Option<ContractConfig> {
        self.receiver.recv().await
    }

    fn close(&mut self) {
        self.receiver.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(byte: u8) -> ContractConfig {
        ContractConfig {
            config_digest: ConfigDigest([byte; 32]),
            signers: vec![],
            transmitters: vec![],
            threshold: 1,
            encoded_config_version: 1,
            encoded: vec![],
        }
    }

    #[tokio::test]
    async fn test_publish_updates_details_and_notifies() {
        let contract = InMemoryConfigContract::new();
        let mut subscription = contract.subscribe_to_new_configs().await.unwrap();

        contract.publish(config(3), 40);

        let details = contract.latest_config_details().await.unwrap();
        assert_eq!(details.changed_in_block, 40);
        assert_eq!(details.config_digest, ConfigDigest([3; 32]));
        assert_eq!(contract.latest_block_height().await.unwrap(), 40);
        assert_eq!(subscription.next().await, Some(config(3)));
        assert_eq!(contract.config_from_logs(40).await.unwrap(), config(3));
    }

    #[tokio::test]
    async fn test_dropped_subscription_ends() {
        let contract = InMemoryConfigContract::new();
        let mut subscription = contract.subscribe_to_new_configs().await.unwrap();
        contract.drop_subscriptions();
        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let contract = InMemoryConfigContract::new();
        contract.set_failing(true);
        assert!(matches!(
            contract.latest_block_height().await,
            Err(ChainError::CallFailed(_))
        ));
    }
}
