//! Shared setup for supervisor tests.

use crate::service::config::SupervisorConfig;
use ocr_01_config::{build_contract_config, LocalPrivateKeys, ProtocolParameters};
use ocr_02_config_tracker::TrackerConfig;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use shared_types::{Address, ContractConfig};
use std::sync::Arc;
use std::time::Duration;

pub(crate) const CONTRACT: Address = Address([0xcc; 20]);

pub(crate) fn peer_id(i: usize) -> String {
    format!("peer-{i}")
}

pub(crate) fn transmit_address(i: usize) -> Address {
    Address([0x70 + i as u8; 20])
}

pub(crate) fn oracle_keys(n: usize, seed: u64) -> Vec<Arc<LocalPrivateKeys>> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| Arc::new(LocalPrivateKeys::generate(&mut rng)))
        .collect()
}

pub(crate) fn contract_config(keys: &[Arc<LocalPrivateKeys>], config_count: u64) -> ContractConfig {
    let credentials: Vec<_> = keys
        .iter()
        .enumerate()
        .map(|(i, k)| k.credentials(peer_id(i), transmit_address(i)))
        .collect();
    let params = ProtocolParameters {
        s: vec![1; keys.len()],
        ..ProtocolParameters::default()
    };
    let mut rng = ChaCha20Rng::seed_from_u64(config_count);
    build_contract_config(CONTRACT, config_count, &credentials, &params, &mut rng).unwrap()
}

pub(crate) fn supervisor_config() -> SupervisorConfig {
    SupervisorConfig {
        tracker: TrackerConfig {
            poll_interval: Duration::from_secs(1),
            skip_confirmations: true,
            ..TrackerConfig::default()
        },
        ..SupervisorConfig::default()
    }
}
