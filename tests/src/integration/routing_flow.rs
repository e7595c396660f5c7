//! # Routing Flow
//!
//! Supervised nodes exchange protocol messages over one in-memory network;
//! the receiving router gates report generation on the current epoch.
//!
//! 1. A future-epoch message is held until that epoch starts
//! 2. Once it starts, the epoch start is delivered before the held message
//! 3. Messages from past epochs are dropped
//! 4. Leader-election messages are never held

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{contract_config, oracles, params, Cluster};
    use ocr_03_message_router::{
        EpochChange, LeaderElectionMessage, ProtocolMessage, ReportGenerationEvent,
        ReportGenerationKind, ReportGenerationMessage,
    };
    use ocr_05_supervisor::{ProtocolInstance, SupervisorState};
    use shared_types::OracleId;
    use std::time::Duration;

    async fn running_cluster(n: usize) -> (Cluster, Vec<ProtocolInstance>) {
        let oracles = oracles(0, n);
        let change = contract_config(
            &oracles.iter().collect::<Vec<_>>(),
            1,
            &params(n, Duration::from_secs(60)),
        );
        let mut cluster = Cluster::new();
        cluster.contract.publish(change.clone(), 10);
        for oracle in &oracles {
            cluster.spawn(oracle);
        }

        let mut instances = Vec::new();
        for node in &mut cluster.nodes {
            node.handle
                .wait_for(|s| *s == SupervisorState::Running(change.config_digest))
                .await;
            instances.push(node.instances.recv().await.unwrap());
        }
        (cluster, instances)
    }

    fn observe(epoch: u32, payload: u8) -> ProtocolMessage {
        ProtocolMessage::ReportGeneration(ReportGenerationMessage::new(
            ReportGenerationKind::Observe,
            epoch,
            1,
            vec![payload],
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_future_epoch_message_waits_for_epoch_start() {
        let (cluster, mut instances) = running_cluster(4).await;

        instances[1]
            .network
            .send_to(&observe(2, 0xaa), OracleId(0))
            .await
            .unwrap();
        let early =
            tokio::time::timeout(Duration::from_millis(100), instances[0].report_generation.recv())
                .await;
        assert!(early.is_err(), "delivered before its epoch started");

        let change = EpochChange {
            epoch: 2,
            leader: OracleId(3),
        };
        instances[0].epoch_changes.send(change).await.unwrap();

        assert_eq!(
            instances[0].report_generation.recv().await.unwrap(),
            ReportGenerationEvent::EpochStarted(change)
        );
        assert_eq!(
            instances[0].report_generation.recv().await.unwrap(),
            ReportGenerationEvent::Message {
                sender: OracleId(1),
                message: ReportGenerationMessage::new(ReportGenerationKind::Observe, 2, 1, vec![0xaa]),
            }
        );

        drop(instances);
        cluster.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_past_epoch_message_is_dropped() {
        let (cluster, mut instances) = running_cluster(4).await;

        let change = EpochChange {
            epoch: 3,
            leader: OracleId(0),
        };
        instances[0].epoch_changes.send(change).await.unwrap();
        assert_eq!(
            instances[0].report_generation.recv().await.unwrap(),
            ReportGenerationEvent::EpochStarted(change)
        );

        instances[2]
            .network
            .send_to(&observe(2, 0xbb), OracleId(0))
            .await
            .unwrap();
        instances[3]
            .network
            .send_to(&observe(3, 0xcc), OracleId(0))
            .await
            .unwrap();

        let ReportGenerationEvent::Message { sender, message } =
            instances[0].report_generation.recv().await.unwrap()
        else {
            panic!("expected a message");
        };
        assert_eq!(sender, OracleId(3));
        assert_eq!(message.payload, vec![0xcc]);

        drop(instances);
        cluster.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_leader_election_ignores_epoch_gate() {
        let (cluster, mut instances) = running_cluster(4).await;

        let new_epoch = LeaderElectionMessage::NewEpoch { epoch: 9 };
        instances[1]
            .network
            .broadcast(&ProtocolMessage::LeaderElection(new_epoch.clone()))
            .await
            .unwrap();

        for instance in &mut instances {
            assert_eq!(
                instance.leader_election.recv().await.unwrap(),
                (OracleId(1), new_epoch.clone())
            );
        }

        drop(instances);
        cluster.shutdown().await;
    }
}
