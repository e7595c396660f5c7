//! Shared setup: oracle identities, published configurations and clusters
//! of supervised nodes on one in-memory network.

use chrono::DateTime;
use ocr_01_config::{
    build_contract_config, LocalPrivateKeys, OracleCredentials, ProtocolParameters, SharedConfig,
};
use ocr_02_config_tracker::{InMemoryConfigContract, TrackerConfig};
use ocr_03_message_router::InMemoryNetwork;
use ocr_04_transmission::InMemoryAggregator;
use ocr_05_supervisor::{
    ExternalProtocol, InstanceDependencies, OracleDependencies, OracleSupervisor,
    ProtocolInstance, SupervisorConfig, SupervisorHandle,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use shared_types::{Address, ConfigDigest, ContractConfig, InMemoryDatabase, OracleId, TokioClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const CONTRACT: Address = Address([0xcc; 20]);

/// One node's identity.
pub struct Oracle {
    pub keys: Arc<LocalPrivateKeys>,
    pub peer_id: String,
    pub transmit_address: Address,
}

impl Oracle {
    pub fn credentials(&self) -> OracleCredentials {
        self.keys
            .credentials(self.peer_id.clone(), self.transmit_address)
    }
}

/// Oracles with indices `first..first + n`.
pub fn oracles(first: usize, n: usize) -> Vec<Oracle> {
    (first..first + n)
        .map(|i| {
            let mut rng = ChaCha20Rng::seed_from_u64(1_000 + i as u64);
            Oracle {
                keys: Arc::new(LocalPrivateKeys::generate(&mut rng)),
                peer_id: format!("peer-{i}"),
                transmit_address: Address([0x40 + i as u8; 20]),
            }
        })
        .collect()
}

pub fn params(n: usize, delta_stage: Duration) -> ProtocolParameters {
    ProtocolParameters {
        s: vec![1; n],
        delta_stage,
        ..ProtocolParameters::default()
    }
}

pub fn contract_config(
    oracles: &[&Oracle],
    config_count: u64,
    params: &ProtocolParameters,
) -> ContractConfig {
    let credentials: Vec<_> = oracles.iter().map(|o| o.credentials()).collect();
    let mut rng = ChaCha20Rng::seed_from_u64(config_count);
    build_contract_config(CONTRACT, config_count, &credentials, params, &mut rng).unwrap()
}

pub fn derive(change: &ContractConfig, oracle: &Oracle) -> (SharedConfig, OracleId) {
    SharedConfig::from_contract_config(
        change,
        oracle.keys.as_ref(),
        &oracle.peer_id,
        oracle.transmit_address,
    )
    .unwrap()
}

pub fn clock() -> Arc<TokioClock> {
    Arc::new(TokioClock::starting_at(
        DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
    ))
}

pub fn supervisor_config() -> SupervisorConfig {
    SupervisorConfig {
        tracker: TrackerConfig {
            poll_interval: Duration::from_secs(1),
            skip_confirmations: true,
            ..TrackerConfig::default()
        },
        ..SupervisorConfig::default()
    }
}

/// One supervised node of a [`Cluster`].
pub struct Node {
    pub handle: SupervisorHandle,
    pub database: Arc<InMemoryDatabase>,
    pub protocol: Arc<ExternalProtocol>,
    pub instances: mpsc::UnboundedReceiver<ProtocolInstance>,
    pub task: JoinHandle<()>,
}

/// Nodes sharing one network, one config contract and one aggregator.
pub struct Cluster {
    pub network: InMemoryNetwork,
    pub contract: Arc<InMemoryConfigContract>,
    pub aggregator: InMemoryAggregator,
    pub nodes: Vec<Node>,
    pub cancel: CancellationToken,
}

impl Cluster {
    pub fn new() -> Self {
        Self {
            network: InMemoryNetwork::new(),
            contract: Arc::new(InMemoryConfigContract::new()),
            aggregator: InMemoryAggregator::new(ConfigDigest::ZERO),
            nodes: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Start a supervisor for `oracle` on a fresh database.
    pub fn spawn(&mut self, oracle: &Oracle) -> usize {
        self.spawn_with_database(oracle, Arc::new(InMemoryDatabase::new()))
    }

    /// Start a supervisor for `oracle` on `database`.
    pub fn spawn_with_database(&mut self, oracle: &Oracle, database: Arc<InMemoryDatabase>) -> usize {
        let (protocol, instances) = ExternalProtocol::new();
        let protocol = Arc::new(protocol);
        let deps = OracleDependencies {
            contract: self.contract.clone(),
            private_keys: oracle.keys.clone(),
            instance: InstanceDependencies {
                database: database.clone(),
                endpoint_factory: Arc::new(self.network.endpoint_factory(oracle.peer_id.clone())),
                transmitter: Arc::new(self.aggregator.transmitter(oracle.transmit_address)),
                protocol: protocol.clone(),
                clock: clock(),
            },
        };
        let (supervisor, handle) = OracleSupervisor::new(deps, supervisor_config());
        let task = tokio::spawn(supervisor.run(self.cancel.child_token()));
        self.nodes.push(Node {
            handle,
            database,
            protocol,
            instances,
            task,
        });
        self.nodes.len() - 1
    }

    /// Cancel every node and wait for all of them.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for node in self.nodes {
            node.task.await.unwrap();
        }
    }
}
