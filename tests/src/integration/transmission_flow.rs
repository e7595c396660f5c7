//! # Transmission Flow
//!
//! Published config → derived schedule → TransmissionScheduler → aggregator.
//!
//! 1. Oracles wait `stage × ΔStage` before submitting
//! 2. A report landed by someone else is not submitted again
//! 3. Of four schedulers handed the same report, one transmits
//! 4. The deviation gate suppresses near-duplicate medians
//! 5. A restarted scheduler fires persisted transmissions on time

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{clock, contract_config, derive, oracles, params, Oracle};
    use ocr_04_transmission::{
        AttestedReport, EventOutcome, InMemoryAggregator, InMemoryTransmitter, TransmissionConfig,
        TransmissionContext, TransmissionScheduler, TransmitEvent,
    };
    use shared_types::{ContractConfig, EpochRound, InMemoryDatabase, TokioClock};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    const DELTA_STAGE: Duration = Duration::from_secs(2);

    type Scheduler = TransmissionScheduler<InMemoryTransmitter, InMemoryDatabase>;

    struct Setup {
        oracles: Vec<Oracle>,
        change: ContractConfig,
        aggregator: InMemoryAggregator,
        clock: Arc<TokioClock>,
    }

    impl Setup {
        fn new() -> Self {
            let oracles = oracles(0, 4);
            let change = contract_config(
                &oracles.iter().collect::<Vec<_>>(),
                1,
                &params(4, DELTA_STAGE),
            );
            let aggregator = InMemoryAggregator::new(change.config_digest);
            Self {
                oracles,
                change,
                aggregator,
                clock: clock(),
            }
        }

        fn context(&self, i: usize) -> TransmissionContext {
            let (shared, oracle_id) = derive(&self.change, &self.oracles[i]);
            TransmissionContext::from_shared_config(&shared, oracle_id)
        }

        fn scheduler(
            &self,
            i: usize,
            database: Arc<InMemoryDatabase>,
        ) -> (Scheduler, mpsc::Sender<TransmitEvent>) {
            TransmissionScheduler::new(
                self.context(i),
                TransmissionConfig::default(),
                Arc::new(self.aggregator.transmitter(self.oracles[i].transmit_address)),
                database,
                self.clock.clone(),
            )
        }

        /// Index of the oracle in `stage` for `epoch_round`.
        fn oracle_in_stage(&self, epoch_round: EpochRound, stage: usize) -> usize {
            (0..self.oracles.len())
                .find(|i| {
                    let context = self.context(*i);
                    context.schedule.stage(epoch_round, context.oracle_id) == stage
                })
                .unwrap()
        }
    }

    fn event(epoch: u32, round: u8, median: i128) -> TransmitEvent {
        TransmitEvent {
            epoch_round: EpochRound::new(epoch, round),
            report: AttestedReport {
                median,
                serialized_report: vec![epoch as u8, round],
                rs: vec![[1; 32]; 2],
                ss: vec![[2; 32]; 2],
                vs: [0; 32],
            },
        }
    }

    // =============================================================================
    // STAGING
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_last_stage_waits_three_delta_stages() {
        let setup = Setup::new();
        let er = EpochRound::new(1, 1);
        let last = setup.oracle_in_stage(er, 3);
        let (mut scheduler, _events) = setup.scheduler(last, Arc::new(InMemoryDatabase::new()));

        let outcome = scheduler
            .handle_event(event(1, 1, 1_000), &CancellationToken::new())
            .await;
        assert_eq!(outcome, EventOutcome::Scheduled(Duration::from_secs(6)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_landed_by_another_oracle_is_skipped() {
        let setup = Setup::new();
        let er = EpochRound::new(1, 1);
        let late = setup.oracle_in_stage(er, 2);
        let database = Arc::new(InMemoryDatabase::new());
        let (scheduler, events) = setup.scheduler(late, database.clone());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(scheduler.run(cancel.clone()));

        events.send(event(1, 1, 1_000)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(database.pending_count(), 1);

        // Someone else's transaction lands before our fire time.
        setup.aggregator.accept_external(er, 1_000);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(setup.aggregator.accepted().is_empty());
        assert_eq!(database.pending_count(), 0);

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_first_stage_oracle_transmits() {
        let setup = Setup::new();
        let er = EpochRound::new(1, 1);
        let first = setup.oracle_in_stage(er, 0);
        let cancel = CancellationToken::new();

        let mut tasks = Vec::new();
        let mut senders = Vec::new();
        for i in 0..setup.oracles.len() {
            let (scheduler, events) = setup.scheduler(i, Arc::new(InMemoryDatabase::new()));
            tasks.push(tokio::spawn(scheduler.run(cancel.clone())));
            senders.push(events);
        }
        for events in &senders {
            events.send(event(1, 1, 1_000)).await.unwrap();
        }
        tokio::time::sleep(DELTA_STAGE * 4).await;

        assert_eq!(
            setup.aggregator.accepted(),
            vec![(
                setup.oracles[first].transmit_address,
                shared_types::PendingTransmissionKey::new(setup.change.config_digest, er)
            )]
        );
        assert_eq!(setup.aggregator.details().latest_answer, 1_000);

        cancel.cancel();
        for task in tasks {
            task.await.unwrap();
        }
    }

    // =============================================================================
    // DEVIATION GATE
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_small_moves_wait_for_contract_to_catch_up() {
        let setup = Setup::new();
        let (mut scheduler, _events) = setup.scheduler(0, Arc::new(InMemoryDatabase::new()));
        let cancel = CancellationToken::new();

        assert!(matches!(
            scheduler.handle_event(event(1, 1, 1_000), &cancel).await,
            EventOutcome::Scheduled(_)
        ));
        // 0.5% with alpha at 1%.
        assert_eq!(
            scheduler.handle_event(event(1, 2, 1_005), &cancel).await,
            EventOutcome::NotWorthTransmitting
        );
        // 2%.
        assert!(matches!(
            scheduler.handle_event(event(1, 3, 1_020), &cancel).await,
            EventOutcome::Scheduled(_)
        ));

        setup.aggregator.accept_external(EpochRound::new(1, 3), 1_020);
        assert!(matches!(
            scheduler.handle_event(event(1, 4, 1_021), &cancel).await,
            EventOutcome::Scheduled(_)
        ));
    }

    // =============================================================================
    // CRASH RECOVERY
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_restarted_scheduler_fires_at_original_time() {
        let setup = Setup::new();
        let er = EpochRound::new(1, 1);
        let last = setup.oracle_in_stage(er, 3);
        let database = Arc::new(InMemoryDatabase::new());

        {
            let (mut scheduler, _events) = setup.scheduler(last, database.clone());
            let outcome = scheduler
                .handle_event(event(1, 1, 1_000), &CancellationToken::new())
                .await;
            assert_eq!(outcome, EventOutcome::Scheduled(Duration::from_secs(6)));
        }
        assert_eq!(database.pending_count(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let (scheduler, _events) = setup.scheduler(last, database.clone());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(scheduler.run(cancel.clone()));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(setup.aggregator.accepted().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(setup.aggregator.accepted().len(), 1);
        assert_eq!(setup.aggregator.accepted()[0].0, setup.oracles[last].transmit_address);
        assert_eq!(database.pending_count(), 0);

        cancel.cancel();
        task.await.unwrap();
    }
}
