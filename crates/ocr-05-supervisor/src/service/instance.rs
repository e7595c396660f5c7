//! # Protocol Instance
//!
//! One adopted configuration's worth of tasks:
//!
//! ```text
//! endpoint ─▶ InboundDecoder ─▶ MessageRouter ─▶ ReportingProtocol ─▶ TransmissionScheduler
//! ```
//!
//! All tasks run under one child token. Teardown cancels it, awaits every
//! task and only then closes the endpoint.

use crate::domain::SupervisorError;
use crate::ports::{ProtocolInstance, ReportingProtocol};
use crate::service::config::SupervisorConfig;
use ocr_01_config::SharedConfig;
use ocr_03_message_router::{
    BinaryNetworkEndpointFactory, MessageRouter, PeerGroup, SerializingEndpoint,
};
use ocr_04_transmission::{ContractTransmitter, TransmissionContext, TransmissionScheduler};
use shared_types::{bounded_call, Clock, ConfigDigest, Database, OracleId};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Driven ports a protocol instance runs on.
#[derive(Clone)]
pub struct InstanceDependencies {
    /// Durable store for pending transmissions.
    pub database: Arc<dyn Database>,
    /// Creates this node's network endpoints.
    pub endpoint_factory: Arc<dyn BinaryNetworkEndpointFactory>,
    /// Submits reports on-chain.
    pub transmitter: Arc<dyn ContractTransmitter>,
    /// External leader election and report generation.
    pub protocol: Arc<dyn ReportingProtocol>,
    /// Wall clock for transmission schedules.
    pub clock: Arc<dyn Clock>,
}

/// A started protocol instance.
pub(crate) struct RunningInstance {
    pub(crate) config_digest: ConfigDigest,
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    endpoint: SerializingEndpoint,
}

impl RunningInstance {
    /// Open the network for `shared` and start every task of the instance.
    pub(crate) async fn start(
        shared: SharedConfig,
        oracle_id: OracleId,
        deps: &InstanceDependencies,
        config: &SupervisorConfig,
        cancel: &CancellationToken,
    ) -> Result<Self, SupervisorError> {
        let public = &shared.public_config;
        let config_digest = public.config_digest;
        let n = public.n();
        let group = PeerGroup {
            config_digest,
            peer_ids: public
                .oracle_identities
                .iter()
                .map(|identity| identity.peer_id.clone())
                .collect(),
            bootstrappers: config.bootstrappers.clone(),
            f: public.f,
        };

        let endpoint = SerializingEndpoint::new(deps.endpoint_factory.make_endpoint(&group)?, n);
        let decoder = endpoint.take_inbound()?;
        if let Err(e) = bounded_call(cancel, config.network_timeout, endpoint.start()).await {
            close_endpoint(&endpoint, config.network_timeout).await;
            return Err(e.into());
        }

        let token = cancel.child_token();
        let (router, handles) = MessageRouter::new(n, &config.router);
        let (scheduler, transmit) = TransmissionScheduler::new(
            TransmissionContext::from_shared_config(&shared, oracle_id),
            config.transmission.clone(),
            Arc::clone(&deps.transmitter),
            Arc::clone(&deps.database),
            Arc::clone(&deps.clock),
        );
        let instance = ProtocolInstance {
            shared_config: Arc::new(shared),
            oracle_id,
            network: endpoint.sender(),
            epoch_changes: handles.epoch_changes,
            leader_election: handles.leader_election,
            report_generation: handles.report_generation,
            transmit,
        };
        let protocol = Arc::clone(&deps.protocol);
        let protocol_token = token.clone();

        let tasks = vec![
            tokio::spawn(decoder.run(handles.inbound, token.clone())),
            tokio::spawn(router.run(token.clone())),
            tokio::spawn(scheduler.run(token.clone())),
            tokio::spawn(async move { protocol.run(instance, protocol_token).await }),
        ];

        info!(
            config_digest = %config_digest,
            oracle_id = %oracle_id,
            n,
            "[ocr-05] Protocol instance started"
        );
        Ok(Self {
            config_digest,
            token,
            tasks,
            endpoint,
        })
    }

    /// Cancel the instance, wait for every task, then close the endpoint.
    pub(crate) async fn shutdown(self, network_timeout: Duration) {
        self.token.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                error!(config_digest = %self.config_digest, error = %e, "[ocr-05] Instance task failed");
            }
        }
        close_endpoint(&self.endpoint, network_timeout).await;
        info!(config_digest = %self.config_digest, "[ocr-05] Protocol instance stopped");
    }
}

// The caller's token may already be cancelled during shutdown, so closing
// is bounded by time only.
async fn close_endpoint(endpoint: &SerializingEndpoint, timeout: Duration) {
    match tokio::time::timeout(timeout, endpoint.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "[ocr-05] Endpoint close failed"),
        Err(_) => warn!(?timeout, "[ocr-05] Endpoint close timed out"),
    }
}
