//! # Pending Queue
//!
//! Min-heap of scheduled transmissions keyed by fire time, plus the
//! startup-recovery selection over persisted records.

use chrono::{DateTime, Utc};
use shared_types::{PendingTransmission, PendingTransmissionKey};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};

/// A transmission waiting for its fire time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTransmission {
    /// Durable key.
    pub key: PendingTransmissionKey,
    /// Durable record; `transmission.time` is the fire time.
    pub transmission: PendingTransmission,
}

impl ScheduledTransmission {
    fn sort_key(&self) -> (DateTime<Utc>, PendingTransmissionKey) {
        (self.transmission.time, self.key)
    }
}

impl Ord for ScheduledTransmission {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for ScheduledTransmission {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Earliest-first queue of [`ScheduledTransmission`]s.
#[derive(Debug, Default)]
pub struct PendingQueue {
    heap: BinaryHeap<Reverse<ScheduledTransmission>>,
}

impl PendingQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transmission. Returns true if it became the earliest.
    pub fn push(&mut self, scheduled: ScheduledTransmission) -> bool {
        let earliest = self
            .peek_time()
            .map_or(true, |head| scheduled.transmission.time < head);
        self.heap.push(Reverse(scheduled));
        earliest
    }

    /// Fire time of the earliest entry.
    pub fn peek_time(&self) -> Option<DateTime<Utc>> {
        self.heap
            .peek()
            .map(|Reverse(scheduled)| scheduled.transmission.time)
    }

    /// Remove the earliest entry.
    pub fn pop(&mut self) -> Option<ScheduledTransmission> {
        self.heap.pop().map(|Reverse(scheduled)| scheduled)
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// What to do with the persisted records of the active configuration.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecoveryPlan {
    /// Records to queue: every unexpired one plus the latest expired one.
    pub schedule: Vec<ScheduledTransmission>,
    /// Expired records superseded by a later expired one.
    pub superseded: Vec<PendingTransmissionKey>,
}

/// Split persisted records into those to re-queue and those to discard.
///
/// An expired record keeps its past fire time, so it fires as soon as the
/// queue is polled.
pub fn plan_recovery(
    records: BTreeMap<PendingTransmissionKey, PendingTransmission>,
    now: DateTime<Utc>,
) -> RecoveryPlan {
    let mut plan = RecoveryPlan::default();
    let mut expired: Vec<ScheduledTransmission> = Vec::new();
    for (key, transmission) in records {
        let scheduled = ScheduledTransmission { key, transmission };
        if scheduled.transmission.time <= now {
            expired.push(scheduled);
        } else {
            plan.schedule.push(scheduled);
        }
    }
    expired.sort_by_key(|scheduled| scheduled.key.epoch_round());
    if let Some(latest) = expired.pop() {
        plan.schedule.push(latest);
    }
    plan.superseded = expired.into_iter().map(|scheduled| scheduled.key).collect();
    plan
}
