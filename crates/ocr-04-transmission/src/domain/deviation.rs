//! # Transmission Gate
//!
//! Whether a freshly finalized report is worth an on-chain transaction.

use shared_types::EpochRound;

const PARTS_PER_BILLION: u128 = 1_000_000_000;

/// The last report this node scheduled during the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestScheduled {
    /// Its epoch and round.
    pub epoch_round: EpochRound,
    /// Its median.
    pub median: i128,
}

/// `|new - old| / |old| > alpha_ppb / 10^9`, evaluated without division.
///
/// A zero `old` deviates whenever `new` differs from it.
pub fn deviates(alpha_ppb: u64, old: i128, new: i128) -> bool {
    if old == 0 {
        return new != 0;
    }
    let change = new.abs_diff(old).saturating_mul(PARTS_PER_BILLION);
    let allowed = u128::from(alpha_ppb).saturating_mul(old.unsigned_abs());
    change > allowed
}

/// Transmit if nothing was scheduled yet this run, if the median moved by
/// more than `alpha_ppb`, or if the contract has caught up with everything
/// scheduled so far.
pub fn should_transmit(
    latest: Option<LatestScheduled>,
    contract_epoch_round: EpochRound,
    new_median: i128,
    alpha_ppb: u64,
) -> bool {
    let Some(latest) = latest else {
        return true;
    };
    let caught_up = contract_epoch_round >= latest.epoch_round;
    deviates(alpha_ppb, latest.median, new_median) || caught_up
}
