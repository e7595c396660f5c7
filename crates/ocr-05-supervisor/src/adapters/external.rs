//! # External Protocol
//!
//! [`ReportingProtocol`] that hands every started instance to a driver
//! outside the supervisor (another process bridge, or a test) and keeps
//! the instance alive until it is cancelled.

use crate::ports::{ProtocolInstance, ReportingProtocol};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Forwards instances to a driver.
pub struct ExternalProtocol {
    driver: mpsc::UnboundedSender<ProtocolInstance>,
    running: AtomicUsize,
}

impl ExternalProtocol {
    /// Create the protocol and the driver's receiving end.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProtocolInstance>) {
        let (driver, instances) = mpsc::unbounded_channel();
        let protocol = Self {
            driver,
            running: AtomicUsize::new(0),
        };
        (protocol, instances)
    }

    /// Instances currently between start and cancellation.
    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportingProtocol for ExternalProtocol {
    async fn run(&self, instance: ProtocolInstance, cancel: CancellationToken) {
        let digest = instance.shared_config.public_config.config_digest;
        if self.driver.send(instance).is_err() {
            warn!(config_digest = %digest, "[ocr-05] No protocol driver attached");
        }
        self.running.fetch_add(1, Ordering::SeqCst);
        cancel.cancelled().await;
        self.running.fetch_sub(1, Ordering::SeqCst);
        debug!(config_digest = %digest, "[ocr-05] Protocol instance released");
    }
}
