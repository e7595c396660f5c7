//! # Transmission Order
//!
//! Every oracle derives the same pseudo-random permutation of oracle
//! indices for a given `(config digest, epoch, round)` from the shared
//! transmission-order key. The permuted index space is cut into stages
//! sized by `S`; an oracle waits `stage * delta_stage` before submitting.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use shared_crypto::hmac_sha256;
use shared_types::{ConfigDigest, EpochRound, OracleId};
use std::time::Duration;

const TRANSMISSION_ORDER_DOMAIN: &[u8] = b"transmission order";

/// Permutation of `0..n` for one report; entry `i` is oracle `i`'s position.
pub fn permutation(
    transmission_order_key: &[u8; 16],
    config_digest: &ConfigDigest,
    epoch_round: EpochRound,
    n: usize,
) -> Vec<usize> {
    let mac = hmac_sha256(
        transmission_order_key,
        &[
            TRANSMISSION_ORDER_DOMAIN,
            config_digest.as_bytes(),
            &epoch_round.epoch.to_be_bytes(),
            &[epoch_round.round],
        ],
    );
    let mut seed = [0u8; 32];
    seed[..16].copy_from_slice(&mac[..16]);
    seed[16..].copy_from_slice(&mac[..16]);
    let mut rng = ChaCha20Rng::from_seed(seed);
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut rng);
    order
}

/// Stage holding `position` when stages have sizes `s`.
///
/// Positions past the sum of `s` fall into the last stage.
pub fn stage_of(position: usize, s: &[u8]) -> usize {
    let mut end = 0usize;
    for (stage, size) in s.iter().enumerate() {
        end += usize::from(*size);
        if position < end {
            return stage;
        }
    }
    s.len().saturating_sub(1)
}

/// Inputs shared by every oracle of a configuration.
#[derive(Debug, Clone)]
pub struct TransmissionSchedule {
    /// Shared transmission-order key.
    pub transmission_order_key: [u8; 16],
    /// Active configuration.
    pub config_digest: ConfigDigest,
    /// Number of oracles.
    pub n: usize,
    /// Stage sizes.
    pub s: Vec<u8>,
    /// Delay between consecutive stages.
    pub delta_stage: Duration,
}

impl TransmissionSchedule {
    /// Stage of `oracle_id` for the report of `epoch_round`.
    pub fn stage(&self, epoch_round: EpochRound, oracle_id: OracleId) -> usize {
        let order = permutation(
            &self.transmission_order_key,
            &self.config_digest,
            epoch_round,
            self.n,
        );
        let position = order
            .get(oracle_id.index())
            .copied()
            .unwrap_or(self.n);
        stage_of(position, &self.s)
    }

    /// How long `oracle_id` waits before submitting the report of `epoch_round`.
    pub fn delay(&self, epoch_round: EpochRound, oracle_id: OracleId) -> Duration {
        let stage = self.stage(epoch_round, oracle_id);
        self.delta_stage
            .saturating_mul(u32::try_from(stage).unwrap_or(u32::MAX))
    }
}
