//! # Oracle Supervisor
//!
//! Owns the lifecycle of this node's protocol instances. At most one
//! instance runs at a time; a replacement is only started after the old
//! one has fully stopped and released its endpoint.
//!
//! ## Adoption of a new configuration
//!
//! | Derivation result | Running instance | New state |
//! |-------------------|------------------|-----------|
//! | Ok | stopped, replaced | `Running(new)` (config persisted) |
//! | Identity error | stopped | `Idle` |
//! | Config or crypto error | kept | unchanged |

use crate::domain::{SupervisorHandle, SupervisorState};
use crate::service::config::SupervisorConfig;
use crate::service::gc::GarbageCollector;
use crate::service::instance::{InstanceDependencies, RunningInstance};
use crate::service::persistence::{persist_config, restore_config};
use ocr_01_config::{DerivationError, PrivateKeys, SharedConfig};
use ocr_02_config_tracker::{ConfigTracker, ContractConfigTracker};
use shared_types::{ConfigDigest, ContractConfig};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Driven ports of a full oracle node.
#[derive(Clone)]
pub struct OracleDependencies {
    /// Configuration contract.
    pub contract: Arc<dyn ContractConfigTracker>,
    /// This node's keys.
    pub private_keys: Arc<dyn PrivateKeys>,
    /// Ports each protocol instance runs on.
    pub instance: InstanceDependencies,
}

/// Runs a protocol instance for whichever configuration is current.
pub struct OracleSupervisor {
    deps: OracleDependencies,
    config: SupervisorConfig,
    state: watch::Sender<SupervisorState>,
    current: Option<RunningInstance>,
}

impl OracleSupervisor {
    /// Create a supervisor in `Idle` and a handle observing its state.
    pub fn new(deps: OracleDependencies, config: SupervisorConfig) -> (Self, SupervisorHandle) {
        let (state, observer) = watch::channel(SupervisorState::Idle);
        let supervisor = Self {
            deps,
            config,
            state,
            current: None,
        };
        (supervisor, SupervisorHandle::new(observer))
    }

    /// Run until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(peer_id = %self.deps.instance.endpoint_factory.peer_id(), "[ocr-05] Oracle supervisor started");

        let gc_token = cancel.child_token();
        let gc = tokio::spawn(
            GarbageCollector::new(
                Arc::clone(&self.deps.instance.database),
                Arc::clone(&self.deps.instance.clock),
                self.config.gc.clone(),
            )
            .run(gc_token.clone()),
        );

        let mut known_digest = ConfigDigest::ZERO;
        if let Some(restored) = restore_config(
            self.deps.instance.database.as_ref(),
            self.config.config_restore_timeout,
            &cancel,
        )
        .await
        {
            known_digest = restored.config_digest;
            self.adopt(restored, false, &cancel).await;
        }

        let tracker_token = cancel.child_token();
        let (tracker, mut changes) = ConfigTracker::new(
            Arc::clone(&self.deps.contract),
            self.config.tracker.clone(),
            known_digest,
        );
        let tracker_task = tokio::spawn(tracker.run(tracker_token.clone()));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                change = changes.recv() => match change {
                    Some(change) => self.adopt(change, true, &cancel).await,
                    None => {
                        warn!("[ocr-05] Config tracker stopped unexpectedly");
                        break;
                    }
                },
            }
        }

        self.stop_current().await;
        tracker_token.cancel();
        gc_token.cancel();
        if let Err(e) = tracker_task.await {
            error!(error = %e, "[ocr-05] Config tracker task failed");
        }
        if let Err(e) = gc.await {
            error!(error = %e, "[ocr-05] Garbage collector task failed");
        }
        self.state.send_replace(SupervisorState::Terminated);
        info!("[ocr-05] Oracle supervisor stopped");
    }

    async fn adopt(&mut self, change: ContractConfig, persist: bool, cancel: &CancellationToken) {
        let digest = change.config_digest;
        if self.current.as_ref().map(|running| running.config_digest) == Some(digest) {
            debug!(config_digest = %digest, "[ocr-05] Config already running");
            return;
        }

        let derived = SharedConfig::from_contract_config(
            &change,
            self.deps.private_keys.as_ref(),
            &self.deps.instance.endpoint_factory.peer_id(),
            self.deps.instance.transmitter.from_address(),
        );
        let (shared, oracle_id) = match derived {
            Ok(derived) => derived,
            Err(DerivationError::Identity(e)) => {
                warn!(
                    config_digest = %digest,
                    error = %e,
                    "[ocr-05] This node is not part of the new config, standing by"
                );
                self.stop_current().await;
                return;
            }
            Err(e) => {
                error!(
                    config_digest = %digest,
                    error = %e,
                    "[ocr-05] Rejecting unusable config, keeping current instance"
                );
                return;
            }
        };

        self.stop_current().await;
        match RunningInstance::start(shared, oracle_id, &self.deps.instance, &self.config, cancel)
            .await
        {
            Ok(instance) => {
                self.current = Some(instance);
                self.state.send_replace(SupervisorState::Running(digest));
            }
            Err(e) => {
                error!(config_digest = %digest, error = %e, "[ocr-05] Could not start protocol instance");
                return;
            }
        }

        if persist {
            persist_config(
                self.deps.instance.database.as_ref(),
                &change,
                self.config.database_timeout,
                cancel,
            )
            .await;
        }
    }

    async fn stop_current(&mut self) {
        if let Some(running) = self.current.take() {
            running.shutdown(self.config.network_timeout).await;
        }
        self.state.send_replace(SupervisorState::Idle);
    }
}
