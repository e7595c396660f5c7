//! # Node Assembly
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration and the encoded-config layout
//! 2. Open the durable store ([`open_database`])
//! 3. Start the supervisor for the node's role
//! 4. Run until shutdown is requested
//!
//! ## Shutdown Sequence
//!
//! 1. Cancel the root token
//! 2. The supervisor tears down its running instance and tracker
//! 3. Wait for the supervisor task to finish

use crate::container::config::NodeConfig;
use anyhow::{Context, Result};
use ocr_05_supervisor::{
    BootstrapDependencies, BootstrapSupervisor, OracleDependencies, OracleSupervisor,
    SupervisorHandle, SupervisorState,
};
use shared_types::Database;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// What a node does, with the ports it does it through.
pub enum NodeRole {
    /// Full oracle: participates in reporting and transmits.
    Oracle(OracleDependencies),
    /// Bootstrap node: only helps peers find each other.
    Bootstrap(BootstrapDependencies),
}

impl NodeRole {
    fn name(&self) -> &'static str {
        match self {
            NodeRole::Oracle(_) => "oracle",
            NodeRole::Bootstrap(_) => "bootstrap",
        }
    }
}

/// A started node.
pub struct OracleNode {
    cancel: CancellationToken,
    supervisor: JoinHandle<()>,
    handle: SupervisorHandle,
}

impl OracleNode {
    /// Validate `config` and start the supervisor for `role`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(config: &NodeConfig, role: NodeRole) -> Result<Self> {
        config.validate().context("Invalid node configuration")?;
        ocr_01_config::verify_layout().context("Encoded config layout out of sync")?;
        info!(
            role = role.name(),
            confirmations = config.supervisor.tracker.confirmations,
            bootstrappers = config.supervisor.bootstrappers.len(),
            "[node] Starting OCR node"
        );

        let cancel = CancellationToken::new();
        let supervisor_config = config.supervisor.clone();
        let (supervisor, handle) = match role {
            NodeRole::Oracle(deps) => {
                let (supervisor, handle) = OracleSupervisor::new(deps, supervisor_config);
                (tokio::spawn(supervisor.run(cancel.clone())), handle)
            }
            NodeRole::Bootstrap(deps) => {
                let (supervisor, handle) = BootstrapSupervisor::new(deps, supervisor_config);
                (tokio::spawn(supervisor.run(cancel.clone())), handle)
            }
        };

        Ok(Self {
            cancel,
            supervisor,
            handle,
        })
    }

    /// Current supervisor state.
    pub fn state(&self) -> SupervisorState {
        self.handle.state()
    }

    /// A handle observing the supervisor.
    pub fn handle(&self) -> SupervisorHandle {
        self.handle.clone()
    }

    /// Run until Ctrl+C, then shut down.
    pub async fn run_until_shutdown(self) -> Result<()> {
        info!("[node] Node is running. Press Ctrl+C to stop.");
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;
        self.shutdown().await
    }

    /// Stop the supervisor and wait for it to finish.
    pub async fn shutdown(self) -> Result<()> {
        info!("[node] Initiating graceful shutdown...");
        self.cancel.cancel();
        self.supervisor
            .await
            .context("Supervisor task failed during shutdown")?;
        info!("[node] Shutdown complete");
        Ok(())
    }
}

/// Open the node's durable store.
///
/// With the `rocksdb` feature this is RocksDB under `storage.data_dir`;
/// otherwise an in-memory store that loses everything on restart.
pub fn open_database(config: &NodeConfig) -> Result<Arc<dyn Database>> {
    #[cfg(feature = "rocksdb")]
    {
        use crate::adapters::{RocksDbConfig, RocksDbDatabase};

        let path = config.storage.data_dir.join("rocksdb");
        let rocks = RocksDbConfig {
            path: path.to_string_lossy().to_string(),
            sync_writes: config.storage.sync_writes,
            ..RocksDbConfig::default()
        };
        let database = RocksDbDatabase::open(&rocks)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        info!(path = %path.display(), "[node] Opened RocksDB store");
        Ok(Arc::new(database))
    }

    #[cfg(not(feature = "rocksdb"))]
    {
        tracing::warn!(
            data_dir = %config.storage.data_dir.display(),
            "[node] Built without rocksdb, pending transmissions will not survive restarts"
        );
        Ok(Arc::new(shared_types::InMemoryDatabase::new()))
    }
}
