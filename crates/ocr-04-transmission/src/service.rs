//! # Transmission Scheduler Service
//!
//! One task per protocol instance. Finalized reports arrive on a bounded
//! queue; accepted ones are persisted, then queued for their staged fire
//! time. A single timer tracks the earliest queued transmission.
//!
//! ```text
//! TransmitEvent ─▶ contract check ─▶ gate ─▶ persist ─▶ queue ─▶ timer
//!                                                                   │
//!                        submit ◀── contract re-check ◀── delete ◀──┘
//! ```

use crate::domain::{
    plan_recovery, should_transmit, LatestScheduled, PendingQueue, ScheduledTransmission,
    TransmissionSchedule, TransmitEvent,
};
use crate::ports::{ContractTransmitter, TransmissionDetails};
use ocr_01_config::SharedConfig;
use shared_types::{
    bounded_call, ChainError, Clock, ConfigDigest, Database, EpochRound, OracleId,
    PendingTransmissionKey, PersistenceError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Scheduler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionConfig {
    /// Bound on each chain call.
    pub blockchain_timeout: Duration,
    /// Bound on each database call.
    pub database_timeout: Duration,
    /// Capacity of the finalized-report queue.
    pub event_queue_capacity: usize,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            blockchain_timeout: Duration::from_secs(20),
            database_timeout: Duration::from_secs(10),
            event_queue_capacity: 10,
        }
    }
}

/// Per-configuration inputs of the scheduler.
#[derive(Debug, Clone)]
pub struct TransmissionContext {
    /// This node's index.
    pub oracle_id: OracleId,
    /// Deviation threshold in parts per billion.
    pub alpha_ppb: u64,
    /// Staging inputs shared by all oracles.
    pub schedule: TransmissionSchedule,
}

impl TransmissionContext {
    /// Context for `oracle_id` under `shared`.
    pub fn from_shared_config(shared: &SharedConfig, oracle_id: OracleId) -> Self {
        let public = &shared.public_config;
        Self {
            oracle_id,
            alpha_ppb: public.alpha_ppb,
            schedule: TransmissionSchedule {
                transmission_order_key: shared.transmission_order_key(),
                config_digest: public.config_digest,
                n: public.n(),
                s: public.s.clone(),
                delta_stage: public.delta_stage,
            },
        }
    }

    fn config_digest(&self) -> ConfigDigest {
        self.schedule.config_digest
    }
}

/// What happened to one finalized report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Persisted and queued for this delay.
    Scheduled(Duration),
    /// The contract runs another configuration.
    WrongConfig,
    /// The contract already holds this or a later report.
    Superseded,
    /// The gate decided the report is not worth a transaction.
    NotWorthTransmitting,
    /// A chain or database call failed; the report is abandoned.
    Failed,
}

/// What happened when a queued transmission came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// Submitted and accepted.
    Transmitted,
    /// The contract moved on; nothing submitted.
    Skipped,
    /// A chain call failed; not retried.
    Failed,
}

/// Staged, crash-safe transmitter for one protocol instance.
pub struct TransmissionScheduler<T, D>
where
    T: ContractTransmitter + ?Sized,
    D: Database + ?Sized,
{
    context: TransmissionContext,
    config: TransmissionConfig,
    transmitter: Arc<T>,
    database: Arc<D>,
    clock: Arc<dyn Clock>,
    events: mpsc::Receiver<TransmitEvent>,
    queue: PendingQueue,
    latest_scheduled: Option<LatestScheduled>,
}

impl<T, D> TransmissionScheduler<T, D>
where
    T: ContractTransmitter + ?Sized,
    D: Database + ?Sized,
{
    /// Create a scheduler and the sending end of its event queue.
    pub fn new(
        context: TransmissionContext,
        config: TransmissionConfig,
        transmitter: Arc<T>,
        database: Arc<D>,
        clock: Arc<dyn Clock>,
    ) -> (Self, mpsc::Sender<TransmitEvent>) {
        let (sender, events) = mpsc::channel(config.event_queue_capacity.max(1));
        let scheduler = Self {
            context,
            config,
            transmitter,
            database,
            clock,
            events,
            queue: PendingQueue::new(),
            latest_scheduled: None,
        };
        (scheduler, sender)
    }

    /// Recover persisted transmissions, then run until `cancel` fires or the
    /// event queue closes and nothing is left to fire.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            config_digest = %self.context.config_digest(),
            oracle_id = %self.context.oracle_id,
            "[ocr-04] Transmission scheduler started"
        );
        self.recover(&cancel).await;

        let timer = sleep(Duration::ZERO);
        tokio::pin!(timer);
        let mut events_open = true;

        loop {
            let armed = match self.delay_until_earliest() {
                Some(delay) => {
                    timer.as_mut().reset(Instant::now() + delay);
                    true
                }
                None => false,
            };
            if !events_open && !armed {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,

                event = self.events.recv(), if events_open => match event {
                    Some(event) => {
                        self.handle_event(event, &cancel).await;
                    }
                    None => events_open = false,
                },

                _ = &mut timer, if armed => {
                    self.fire_earliest(&cancel).await;
                }
            }
        }

        info!(
            queued = self.queue.len(),
            "[ocr-04] Transmission scheduler stopped"
        );
    }

    fn delay_until_earliest(&self) -> Option<Duration> {
        let due = self.queue.peek_time()?;
        Some((due - self.clock.now()).to_std().unwrap_or(Duration::ZERO))
    }

    /// Queue persisted transmissions of the active configuration.
    async fn recover(&mut self, cancel: &CancellationToken) {
        let digest = self.context.config_digest();
        let records = match bounded_call(
            cancel,
            self.config.database_timeout,
            self.database.pending_transmissions_with_config_digest(digest),
        )
        .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "[ocr-04] Could not load pending transmissions");
                return;
            }
        };

        let plan = plan_recovery(records, self.clock.now());
        for key in &plan.superseded {
            if let Err(e) = self.delete(key, cancel).await {
                warn!(epoch_round = %key.epoch_round(), error = %e, "[ocr-04] Could not delete superseded transmission");
            }
        }
        info!(
            recovered = plan.schedule.len(),
            superseded = plan.superseded.len(),
            "[ocr-04] Recovered pending transmissions"
        );
        for scheduled in plan.schedule {
            self.queue.push(scheduled);
        }
    }

    /// Decide on, persist and queue one finalized report.
    pub async fn handle_event(
        &mut self,
        event: TransmitEvent,
        cancel: &CancellationToken,
    ) -> EventOutcome {
        let epoch_round = event.epoch_round;
        let details = match self.contract_details(cancel).await {
            Ok(details) => details,
            Err(e) => {
                warn!(epoch_round = %epoch_round, error = %e, "[ocr-04] Could not read contract state, dropping report");
                return EventOutcome::Failed;
            }
        };
        if details.config_digest != self.context.config_digest() {
            info!(
                epoch_round = %epoch_round,
                contract_digest = %details.config_digest,
                "[ocr-04] Contract runs another config, dropping report"
            );
            return EventOutcome::WrongConfig;
        }
        if details.epoch_round >= epoch_round {
            debug!(
                epoch_round = %epoch_round,
                contract_epoch_round = %details.epoch_round,
                "[ocr-04] Report already superseded on-chain"
            );
            return EventOutcome::Superseded;
        }
        if !should_transmit(
            self.latest_scheduled,
            details.epoch_round,
            event.report.median,
            self.context.alpha_ppb,
        ) {
            debug!(epoch_round = %epoch_round, median = event.report.median, "[ocr-04] Report not worth transmitting");
            return EventOutcome::NotWorthTransmitting;
        }

        let delay = self
            .context
            .schedule
            .delay(epoch_round, self.context.oracle_id);
        let time = self.clock.now()
            + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
        let key = PendingTransmissionKey::new(self.context.config_digest(), epoch_round);
        let median = event.report.median;
        let transmission = event.report.into_pending(time);

        if let Err(e) = bounded_call(
            cancel,
            self.config.database_timeout,
            self.database.store_pending_transmission(&key, &transmission),
        )
        .await
        {
            error!(epoch_round = %epoch_round, error = %e, "[ocr-04] Could not persist transmission, dropping report");
            return EventOutcome::Failed;
        }

        self.queue.push(ScheduledTransmission { key, transmission });
        self.latest_scheduled = Some(LatestScheduled {
            epoch_round,
            median,
        });
        info!(
            epoch_round = %epoch_round,
            median,
            delay_ms = delay.as_millis() as u64,
            "[ocr-04] Transmission scheduled"
        );
        EventOutcome::Scheduled(delay)
    }

    /// Take the earliest queued transmission and submit it if still useful.
    async fn fire_earliest(&mut self, cancel: &CancellationToken) -> Option<FireOutcome> {
        let ScheduledTransmission { key, transmission } = self.queue.pop()?;
        let epoch_round = key.epoch_round();

        if let Err(e) = self.delete(&key, cancel).await {
            warn!(epoch_round = %epoch_round, error = %e, "[ocr-04] Could not delete pending transmission");
        }

        let details = match self.contract_details(cancel).await {
            Ok(details) => details,
            Err(e) => {
                warn!(epoch_round = %epoch_round, error = %e, "[ocr-04] Could not re-check contract state, abandoning transmission");
                return Some(FireOutcome::Failed);
            }
        };
        if !still_useful(&details, key.config_digest, epoch_round) {
            info!(
                epoch_round = %epoch_round,
                contract_epoch_round = %details.epoch_round,
                "[ocr-04] Transmission no longer needed, skipping"
            );
            return Some(FireOutcome::Skipped);
        }

        match bounded_call(
            cancel,
            self.config.blockchain_timeout,
            self.transmitter.transmit(&key, &transmission),
        )
        .await
        {
            Ok(()) => {
                info!(
                    epoch_round = %epoch_round,
                    median = transmission.median,
                    from = %self.transmitter.from_address(),
                    "[ocr-04] Report transmitted"
                );
                Some(FireOutcome::Transmitted)
            }
            Err(e) => {
                error!(epoch_round = %epoch_round, error = %e, "[ocr-04] Transmission failed");
                Some(FireOutcome::Failed)
            }
        }
    }

    async fn contract_details(
        &self,
        cancel: &CancellationToken,
    ) -> Result<TransmissionDetails, ChainError> {
        bounded_call(
            cancel,
            self.config.blockchain_timeout,
            self.transmitter.latest_transmission_details(),
        )
        .await
    }

    async fn delete(
        &self,
        key: &PendingTransmissionKey,
        cancel: &CancellationToken,
    ) -> Result<(), PersistenceError> {
        bounded_call(
            cancel,
            self.config.database_timeout,
            self.database.delete_pending_transmission(key),
        )
        .await
    }
}

fn still_useful(details: &TransmissionDetails, config_digest: ConfigDigest, epoch_round: EpochRound) -> bool {
    details.config_digest == config_digest && details.epoch_round < epoch_round
}
