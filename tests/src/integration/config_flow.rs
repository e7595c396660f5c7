//! # Configuration Flow
//!
//! Contract → ConfigTracker → OracleSupervisor across several nodes.
//!
//! 1. A change is emitted once, and only after enough confirmations
//! 2. Every listed node adopts it and opens its endpoint
//! 3. A reconfiguration swaps instances; dropped nodes stand by
//! 4. A restarted node resumes from its persisted config

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{contract_config, oracles, params, Cluster};
    use ocr_02_config_tracker::{ConfigTracker, PollOutcome, TrackerConfig};
    use ocr_05_supervisor::SupervisorState;
    use shared_types::{Database, InMemoryDatabase, OracleId};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    // =============================================================================
    // CONFIRMATIONS
    // =============================================================================

    #[tokio::test]
    async fn test_change_emitted_once_after_three_confirmations() {
        let oracles = oracles(0, 4);
        let change = contract_config(
            &oracles.iter().collect::<Vec<_>>(),
            1,
            &params(4, Duration::from_secs(60)),
        );
        let cluster = Cluster::new();
        cluster.contract.publish(change.clone(), 100);
        cluster.contract.set_height(101);

        let config = TrackerConfig {
            confirmations: 3,
            ..TrackerConfig::default()
        };
        let (mut tracker, mut changes) =
            ConfigTracker::new(cluster.contract.clone(), config, shared_types::ConfigDigest::ZERO);
        let cancel = CancellationToken::new();

        assert_eq!(tracker.poll_once(&cancel).await, PollOutcome::AwaitingConfirmation);
        assert!(changes.try_recv().is_err());

        cluster.contract.set_height(102);
        assert_eq!(
            tracker.poll_once(&cancel).await,
            PollOutcome::Emitted(change.config_digest)
        );
        assert_eq!(changes.try_recv().unwrap(), change);

        cluster.contract.set_height(150);
        assert_eq!(tracker.poll_once(&cancel).await, PollOutcome::Unchanged);
        assert!(changes.try_recv().is_err());
    }

    // =============================================================================
    // ADOPTION ACROSS NODES
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_all_listed_nodes_adopt_and_connect() {
        let oracles = oracles(0, 4);
        let change = contract_config(
            &oracles.iter().collect::<Vec<_>>(),
            1,
            &params(4, Duration::from_secs(60)),
        );
        let mut cluster = Cluster::new();
        cluster.contract.publish(change.clone(), 10);
        for oracle in &oracles {
            cluster.spawn(oracle);
        }

        for (i, node) in cluster.nodes.iter_mut().enumerate() {
            let state = node
                .handle
                .wait_for(|s| matches!(s, SupervisorState::Running(_)))
                .await;
            assert_eq!(state, SupervisorState::Running(change.config_digest));
            let instance = node.instances.recv().await.unwrap();
            assert_eq!(instance.oracle_id, OracleId(i as u8));
        }
        assert_eq!(cluster.network.active_endpoints(&change.config_digest), 4);

        cluster.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconfiguration_swaps_members_and_idles_dropped_node() {
        let members = oracles(0, 5);
        let first = contract_config(
            &members[..4].iter().collect::<Vec<_>>(),
            1,
            &params(4, Duration::from_secs(60)),
        );
        // Oracle 3 leaves, oracle 4 joins.
        let second = contract_config(
            &[&members[0], &members[1], &members[2], &members[4]],
            2,
            &params(4, Duration::from_secs(60)),
        );

        let mut cluster = Cluster::new();
        cluster.contract.publish(first.clone(), 10);
        for oracle in &members {
            cluster.spawn(oracle);
        }
        for node in &mut cluster.nodes[..4] {
            node.handle
                .wait_for(|s| *s == SupervisorState::Running(first.config_digest))
                .await;
        }
        // Not in the first config.
        assert_eq!(cluster.nodes[4].handle.state(), SupervisorState::Idle);

        cluster.contract.publish(second.clone(), 20);
        for i in [0, 1, 2, 4] {
            cluster.nodes[i]
                .handle
                .wait_for(|s| *s == SupervisorState::Running(second.config_digest))
                .await;
        }
        cluster.nodes[3]
            .handle
            .wait_for(|s| *s == SupervisorState::Idle)
            .await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(cluster.network.active_endpoints(&first.config_digest), 0);
        assert_eq!(cluster.network.active_endpoints(&second.config_digest), 4);
        assert_eq!(
            cluster.nodes[3].database.read_config().await.unwrap(),
            Some(first)
        );
        assert_eq!(
            cluster.nodes[4].database.read_config().await.unwrap(),
            Some(second)
        );

        cluster.shutdown().await;
    }

    // =============================================================================
    // RESTART
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_restarted_node_resumes_without_reaching_contract() {
        let oracles = oracles(0, 4);
        let change = contract_config(
            &oracles.iter().collect::<Vec<_>>(),
            1,
            &params(4, Duration::from_secs(60)),
        );
        let database = Arc::new(InMemoryDatabase::new());

        // First run learns the config from the contract.
        let mut cluster = Cluster::new();
        cluster.contract.publish(change.clone(), 10);
        cluster.spawn_with_database(&oracles[0], database.clone());
        cluster.nodes[0]
            .handle
            .wait_for(|s| *s == SupervisorState::Running(change.config_digest))
            .await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        cluster.shutdown().await;

        // Second run: the chain is unreachable.
        let mut cluster = Cluster::new();
        cluster.contract.set_failing(true);
        cluster.spawn_with_database(&oracles[0], database);
        let state = cluster.nodes[0]
            .handle
            .wait_for(|s| matches!(s, SupervisorState::Running(_)))
            .await;
        assert_eq!(state, SupervisorState::Running(change.config_digest));
        assert_eq!(cluster.network.active_endpoints(&change.config_digest), 1);

        cluster.shutdown().await;
    }
}
