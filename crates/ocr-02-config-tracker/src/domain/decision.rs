//! # Poll Decision
//!
//! A change seen at `changed_in_block` counts as confirmed once the chain
//! height reaches `changed_in_block + confirmations - 1`; the block holding
//! the change is its first confirmation.

use crate::ports::ConfigDetails;
use shared_types::ConfigDigest;
use std::time::Duration;

/// Poll interval ceiling while a change awaits confirmation.
pub const AWAITING_CONFIRMATION_POLL_CAP: Duration = Duration::from_secs(15);

/// What a poll should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// The contract has never been configured.
    NoConfig,
    /// The latest digest is the one already known.
    Unchanged,
    /// A new digest exists but is not yet deep enough.
    AwaitingConfirmation {
        /// Height at which the change becomes confirmed.
        confirmed_at: u64,
    },
    /// Fetch the new configuration from the logs of this block.
    Fetch {
        /// Block holding the "config set" log.
        changed_in_block: u64,
    },
}

/// Decide what to do with the latest on-chain details.
pub fn decide(
    last_known: ConfigDigest,
    details: ConfigDetails,
    height: u64,
    confirmations: u16,
    skip_confirmations: bool,
) -> PollDecision {
    if details.config_digest.is_zero() {
        return PollDecision::NoConfig;
    }
    if details.config_digest == last_known {
        return PollDecision::Unchanged;
    }
    let confirmed_at = details
        .changed_in_block
        .saturating_add(u64::from(confirmations))
        .saturating_sub(1);
    if !skip_confirmations && height < confirmed_at {
        return PollDecision::AwaitingConfirmation { confirmed_at };
    }
    PollDecision::Fetch {
        changed_in_block: details.changed_in_block,
    }
}

/// Delay until the next poll.
pub fn next_poll_delay(poll_interval: Duration, awaiting_confirmation: bool) -> Duration {
    if awaiting_confirmation {
        poll_interval.min(AWAITING_CONFIRMATION_POLL_CAP)
    } else {
        poll_interval
    }
}
