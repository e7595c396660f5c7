//! # Config Tracker Service
//!
//! One task, three event sources dispatched through a single `select!`:
//!
//! | Source | Action |
//! |--------|--------|
//! | Poll timer | Read height and latest details, maybe fetch and emit |
//! | Subscription | Schedule an immediate poll |
//! | Resubscribe timer | Reopen a closed or failed subscription |
//!
//! Confirmed changes go to a bounded queue. A full queue blocks emission
//! until the consumer catches up or the tracker is cancelled.

use crate::domain::{decide, next_poll_delay, PollDecision};
use crate::ports::{ContractConfigSubscription, ContractConfigTracker};
use ocr_01_config::SUPPORTED_ENCODED_CONFIG_VERSION;
use shared_types::{bounded_call, ChainError, ConfigDigest, ContractConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Tracker settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Interval between polls of the contract.
    pub poll_interval: Duration,
    /// Back-off before reopening a failed subscription.
    pub resubscribe_interval: Duration,
    /// Depth a change must reach before it is emitted.
    pub confirmations: u16,
    /// Emit changes without waiting for confirmations.
    pub skip_confirmations: bool,
    /// Bound on each chain call.
    pub blockchain_timeout: Duration,
    /// Capacity of the emission queue.
    pub emission_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            resubscribe_interval: Duration::from_secs(120),
            confirmations: 3,
            skip_confirmations: false,
            blockchain_timeout: Duration::from_secs(20),
            emission_capacity: 5,
        }
    }
}

/// Result of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing new.
    Unchanged,
    /// A change exists but is not yet confirmed.
    AwaitingConfirmation,
    /// A change was emitted.
    Emitted(ConfigDigest),
    /// A change was fetched but not emitted.
    Dropped,
    /// A chain call failed; retried next poll.
    Failed,
}

/// Tracks configuration changes of one contract.
pub struct ConfigTracker<T: ContractConfigTracker + ?Sized> {
    contract: Arc<T>,
    config: TrackerConfig,
    last_known: ConfigDigest,
    changes: mpsc::Sender<ContractConfig>,
}

impl<T: ContractConfigTracker + ?Sized> ConfigTracker<T> {
    /// Create a tracker and the receiving end of its emission queue.
    ///
    /// `initial_digest` is the digest the caller already runs with
    /// ([`ConfigDigest::ZERO`] if none).
    pub fn new(
        contract: Arc<T>,
        config: TrackerConfig,
        initial_digest: ConfigDigest,
    ) -> (Self, mpsc::Receiver<ContractConfig>) {
        let (changes, receiver) = mpsc::channel(config.emission_capacity.max(1));
        let tracker = Self {
            contract,
            config,
            last_known: initial_digest,
            changes,
        };
        (tracker, receiver)
    }

    /// Run until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            last_known = %self.last_known,
            confirmations = self.config.confirmations,
            "[ocr-02] Config tracker started"
        );

        let poll = sleep(Duration::ZERO);
        tokio::pin!(poll);
        let resubscribe = sleep(Duration::ZERO);
        tokio::pin!(resubscribe);
        let mut resubscribe_armed = true;
        let mut subscription: Option<Box<dyn ContractConfigSubscription>> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                _ = &mut poll => {
                    let outcome = self.poll_once(&cancel).await;
                    let awaiting = outcome == PollOutcome::AwaitingConfirmation;
                    let delay = next_poll_delay(self.config.poll_interval, awaiting);
                    poll.as_mut().reset(Instant::now() + delay);
                }

                notification = next_notification(&mut subscription), if subscription.is_some() => {
                    match notification {
                        Some(config) => {
                            debug!(config_digest = %config.config_digest, "[ocr-02] Config notification, polling now");
                            poll.as_mut().reset(Instant::now());
                        }
                        None => {
                            warn!("[ocr-02] Config subscription ended, resubscribing after back-off");
                            if let Some(mut ended) = subscription.take() {
                                ended.close();
                            }
                            resubscribe
                                .as_mut()
                                .reset(Instant::now() + self.config.resubscribe_interval);
                            resubscribe_armed = true;
                        }
                    }
                }

                _ = &mut resubscribe, if resubscribe_armed => {
                    resubscribe_armed = false;
                    match self.subscribe(&cancel).await {
                        Ok(opened) => subscription = Some(opened),
                        Err(ChainError::Cancelled) => break,
                        Err(e) => {
                            warn!(error = %e, "[ocr-02] Failed to subscribe to config changes");
                            resubscribe
                                .as_mut()
                                .reset(Instant::now() + self.config.resubscribe_interval);
                            resubscribe_armed = true;
                        }
                    }
                }
            }
        }

        if let Some(mut open) = subscription.take() {
            open.close();
        }
        info!("[ocr-02] Config tracker stopped");
    }

    async fn subscribe(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn ContractConfigSubscription>, ChainError> {
        bounded_call(
            cancel,
            self.config.blockchain_timeout,
            self.contract.subscribe_to_new_configs(),
        )
        .await
    }

    /// One poll of the contract. Emits at most one change.
    pub async fn poll_once(&mut self, cancel: &CancellationToken) -> PollOutcome {
        let timeout = self.config.blockchain_timeout;

        let height = match bounded_call(cancel, timeout, self.contract.latest_block_height()).await {
            Ok(height) => height,
            Err(e) => return self.failed("latest_block_height", e),
        };
        let details =
            match bounded_call(cancel, timeout, self.contract.latest_config_details()).await {
                Ok(details) => details,
                Err(e) => return self.failed("latest_config_details", e),
            };

        let changed_in_block = match decide(
            self.last_known,
            details,
            height,
            self.config.confirmations,
            self.config.skip_confirmations,
        ) {
            PollDecision::NoConfig => {
                debug!("[ocr-02] Contract has no config yet");
                return PollOutcome::Unchanged;
            }
            PollDecision::Unchanged => return PollOutcome::Unchanged,
            PollDecision::AwaitingConfirmation { confirmed_at } => {
                debug!(
                    config_digest = %details.config_digest,
                    height,
                    confirmed_at,
                    "[ocr-02] Config change awaiting confirmation"
                );
                return PollOutcome::AwaitingConfirmation;
            }
            PollDecision::Fetch { changed_in_block } => changed_in_block,
        };

        let config = match bounded_call(
            cancel,
            timeout,
            self.contract.config_from_logs(changed_in_block),
        )
        .await
        {
            Ok(config) => config,
            Err(e) => return self.failed("config_from_logs", e),
        };

        if config.config_digest != details.config_digest {
            warn!(
                expected = %details.config_digest,
                fetched = %config.config_digest,
                block = changed_in_block,
                "[ocr-02] Config from logs does not match latest details, will re-poll"
            );
            return PollOutcome::Dropped;
        }

        if config.encoded_config_version != SUPPORTED_ENCODED_CONFIG_VERSION {
            error!(
                alert = "unsupported_config_version",
                config_digest = %config.config_digest,
                version = config.encoded_config_version,
                supported = SUPPORTED_ENCODED_CONFIG_VERSION,
                "[ocr-02] Dropping confirmed config with unsupported encoded version"
            );
            return PollOutcome::Dropped;
        }

        let digest = config.config_digest;
        tokio::select! {
            _ = cancel.cancelled() => PollOutcome::Unchanged,
            sent = self.changes.send(config) => match sent {
                Ok(()) => {
                    info!(config_digest = %digest, block = changed_in_block, "[ocr-02] Emitted config change");
                    self.last_known = digest;
                    PollOutcome::Emitted(digest)
                }
                Err(_) => {
                    warn!("[ocr-02] Config change consumer is gone");
                    PollOutcome::Dropped
                }
            },
        }
    }

    fn failed(&self, call: &str, error: ChainError) -> PollOutcome {
        if error != ChainError::Cancelled {
            warn!(call, error = %error, "[ocr-02] Chain call failed, retrying next poll");
        }
        PollOutcome::Failed
    }
}

async fn next_notification(
    subscription: &mut Option<Box<dyn ContractConfigSubscription>>,
) -> Option<ContractConfig> {
    match subscription {
        Some(open) => open.next().await,
        None => std::future::pending().await,
    }
}
