//! # Bootstrap Supervisor
//!
//! Lifecycle of a bootstrap-only node: follows configuration changes and
//! runs one network bootstrapper for the current peer set. Holds no keys,
//! generates no reports and transmits nothing.

use crate::domain::{SupervisorError, SupervisorHandle, SupervisorState};
use crate::service::config::SupervisorConfig;
use crate::service::persistence::{persist_config, restore_config};
use ocr_01_config::PublicConfig;
use ocr_02_config_tracker::{ConfigTracker, ContractConfigTracker};
use ocr_03_message_router::{Bootstrapper, BootstrapperFactory, PeerGroup};
use shared_types::{bounded_call, ConfigDigest, ContractConfig, Database};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Driven ports of a bootstrap node.
#[derive(Clone)]
pub struct BootstrapDependencies {
    /// Configuration contract.
    pub contract: Arc<dyn ContractConfigTracker>,
    /// Durable store for the last configuration.
    pub database: Arc<dyn Database>,
    /// Creates bootstrappers.
    pub bootstrapper_factory: Arc<dyn BootstrapperFactory>,
}

struct RunningBootstrapper {
    config_digest: ConfigDigest,
    bootstrapper: Arc<dyn Bootstrapper>,
}

impl RunningBootstrapper {
    async fn shutdown(self, timeout: Duration) {
        match tokio::time::timeout(timeout, self.bootstrapper.close()).await {
            Ok(Ok(())) => info!(config_digest = %self.config_digest, "[ocr-05] Bootstrapper stopped"),
            Ok(Err(e)) => warn!(config_digest = %self.config_digest, error = %e, "[ocr-05] Bootstrapper close failed"),
            Err(_) => warn!(config_digest = %self.config_digest, "[ocr-05] Bootstrapper close timed out"),
        }
    }
}

/// Runs a bootstrapper for whichever configuration is current.
pub struct BootstrapSupervisor {
    deps: BootstrapDependencies,
    config: SupervisorConfig,
    state: watch::Sender<SupervisorState>,
    current: Option<RunningBootstrapper>,
}

impl BootstrapSupervisor {
    /// Create a supervisor in `Idle` and a handle observing its state.
    pub fn new(deps: BootstrapDependencies, config: SupervisorConfig) -> (Self, SupervisorHandle) {
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
        info!("[ocr-05] Bootstrap supervisor started");

        let mut known_digest = ConfigDigest::ZERO;
        if let Some(restored) = restore_config(
            self.deps.database.as_ref(),
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
        if let Err(e) = tracker_task.await {
            error!(error = %e, "[ocr-05] Config tracker task failed");
        }
        self.state.send_replace(SupervisorState::Terminated);
        info!("[ocr-05] Bootstrap supervisor stopped");
    }

    async fn adopt(&mut self, change: ContractConfig, persist: bool, cancel: &CancellationToken) {
        let digest = change.config_digest;
        if self.current.as_ref().map(|running| running.config_digest) == Some(digest) {
            debug!(config_digest = %digest, "[ocr-05] Config already bootstrapped");
            return;
        }

        let group = match self.peer_group(&change) {
            Ok(group) => group,
            Err(e) => {
                error!(config_digest = %digest, error = %e, "[ocr-05] Rejecting unusable config, keeping current bootstrapper");
                return;
            }
        };

        self.stop_current().await;
        match self.start_bootstrapper(&group, cancel).await {
            Ok(bootstrapper) => {
                self.current = Some(RunningBootstrapper {
                    config_digest: digest,
                    bootstrapper,
                });
                self.state.send_replace(SupervisorState::Running(digest));
                info!(config_digest = %digest, peers = group.peer_ids.len(), "[ocr-05] Bootstrapper started");
            }
            Err(e) => {
                error!(config_digest = %digest, error = %e, "[ocr-05] Could not start bootstrapper");
                return;
            }
        }

        if persist {
            persist_config(
                self.deps.database.as_ref(),
                &change,
                self.config.database_timeout,
                cancel,
            )
            .await;
        }
    }

    fn peer_group(&self, change: &ContractConfig) -> Result<PeerGroup, SupervisorError> {
        let (public, _) = PublicConfig::from_contract_config(change)?;
        Ok(PeerGroup {
            config_digest: public.config_digest,
            peer_ids: public
                .oracle_identities
                .iter()
                .map(|identity| identity.peer_id.clone())
                .collect(),
            bootstrappers: self.config.bootstrappers.clone(),
            f: public.f,
        })
    }

    async fn start_bootstrapper(
        &self,
        group: &PeerGroup,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn Bootstrapper>, SupervisorError> {
        let bootstrapper = self.deps.bootstrapper_factory.make_bootstrapper(group)?;
        bounded_call(cancel, self.config.network_timeout, bootstrapper.start()).await?;
        Ok(bootstrapper)
    }

    async fn stop_current(&mut self) {
        if let Some(running) = self.current.take() {
            running.shutdown(self.config.network_timeout).await;
        }
        self.state.send_replace(SupervisorState::Idle);
    }
}
