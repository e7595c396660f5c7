//! # Pending Transmission Garbage Collector
//!
//! Deletes pending-transmission records past the retention window on a
//! jittered interval, so a fleet of nodes sharing one database host does
//! not collect in lockstep.

use crate::domain::{jittered_interval, GcConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared_types::{bounded_call, Clock, Database, PersistenceError};
use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Periodic deletion of stale pending transmissions.
pub struct GarbageCollector {
    database: Arc<dyn Database>,
    clock: Arc<dyn Clock>,
    config: GcConfig,
    rng: StdRng,
}

impl GarbageCollector {
    /// Create a collector.
    pub fn new(database: Arc<dyn Database>, clock: Arc<dyn Clock>, config: GcConfig) -> Self {
        Self {
            database,
            clock,
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Delete everything older than the retention window. Returns the count.
    pub async fn collect_once(&self, cancel: &CancellationToken) -> Result<usize, PersistenceError> {
        let retention = chrono::Duration::from_std(self.config.retention)
            .unwrap_or_else(|_| chrono::Duration::days(1));
        let cutoff = self.clock.now() - retention;
        bounded_call(
            cancel,
            self.config.database_timeout,
            self.database.delete_pending_transmissions_older_than(cutoff),
        )
        .await
    }

    /// Collect until `cancel` fires. Failures wait for the next interval.
    pub async fn run(mut self, cancel: CancellationToken) {
        debug!("[ocr-05] Garbage collector started");
        loop {
            let wait = jittered_interval(self.config.base_interval, self.config.max_jitter, &mut self.rng);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(wait) => {}
            }
            match self.collect_once(&cancel).await {
                Ok(0) => debug!("[ocr-05] No stale pending transmissions"),
                Ok(removed) => info!(removed, "[ocr-05] Deleted stale pending transmissions"),
                Err(PersistenceError::Cancelled) => break,
                Err(e) => warn!(error = %e, "[ocr-05] Garbage collection failed, retrying next interval"),
            }
        }
        debug!("[ocr-05] Garbage collector stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use shared_types::{
        ConfigDigest, EpochRound, InMemoryDatabase, PendingTransmission, PendingTransmissionKey,
        TokioClock,
    };
    use std::time::Duration;

    fn record(time: chrono::DateTime<chrono::Utc>) -> PendingTransmission {
        PendingTransmission {
            time,
            median: 0,
            serialized_report: vec![],
            rs: vec![],
            ss: vec![],
            vs: [0; 32],
        }
    }

    async fn seeded(now: chrono::DateTime<chrono::Utc>) -> Arc<InMemoryDatabase> {
        let database = Arc::new(InMemoryDatabase::new());
        let digest = ConfigDigest([1; 32]);
        let old = PendingTransmissionKey::new(digest, EpochRound::new(1, 1));
        let fresh = PendingTransmissionKey::new(digest, EpochRound::new(1, 2));
        database
            .store_pending_transmission(&old, &record(now - chrono::Duration::hours(25)))
            .await
            .unwrap();
        database
            .store_pending_transmission(&fresh, &record(now - chrono::Duration::hours(1)))
            .await
            .unwrap();
        database
    }

    #[tokio::test(start_paused = true)]
    async fn test_collects_only_past_retention() {
        let clock = Arc::new(TokioClock::starting_at(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let database = seeded(clock.now()).await;
        let collector = GarbageCollector::new(database.clone(), clock, GcConfig::default());

        assert_eq!(collector.collect_once(&CancellationToken::new()).await, Ok(1));
        assert_eq!(database.pending_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_on_interval_and_survives_failures() {
        let clock = Arc::new(TokioClock::starting_at(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let database = seeded(clock.now()).await;
        database.set_fail_writes(true);
        let config = GcConfig {
            base_interval: Duration::from_secs(60),
            max_jitter: 0.1,
            ..GcConfig::default()
        };
        let cancel = CancellationToken::new();
        let task = tokio::spawn(
            GarbageCollector::new(database.clone(), clock, config).run(cancel.clone()),
        );

        tokio::time::sleep(Duration::from_secs(70)).await;
        assert_eq!(database.pending_count(), 2);

        database.set_fail_writes(false);
        tokio::time::sleep(Duration::from_secs(70)).await;
        assert_eq!(database.pending_count(), 1);

        cancel.cancel();
        task.await.unwrap();
    }
}
