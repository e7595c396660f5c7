//! # Per-Sender Message Buffer
//!
//! Fixed-capacity FIFO. When full, pushing evicts the oldest entry so a
//! sender flooding future epochs only ever costs `capacity` slots.

use super::messages::ReportGenerationMessage;
use std::collections::VecDeque;

/// Bounded FIFO of early report-generation messages from one sender.
#[derive(Debug, Clone)]
pub struct MessageBuffer {
    entries: VecDeque<ReportGenerationMessage>,
    capacity: usize,
}

impl MessageBuffer {
    /// Create an empty buffer. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `message`, returning the evicted oldest entry if the buffer was full.
    pub fn push(&mut self, message: ReportGenerationMessage) -> Option<ReportGenerationMessage> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(message);
        evicted
    }

    /// Remove and return every message of `epoch`, dropping those older.
    ///
    /// Returns `(delivered, dropped_count)`; later-epoch messages stay
    /// buffered in their original order.
    pub fn drain_epoch(&mut self, epoch: u32) -> (Vec<ReportGenerationMessage>, usize) {
        let mut delivered = Vec::new();
        let mut dropped = 0;
        let mut kept = VecDeque::with_capacity(self.capacity);
        for message in self.entries.drain(..) {
            if message.epoch < epoch {
                dropped += 1;
            } else if message.epoch == epoch {
                delivered.push(message);
            } else {
                kept.push_back(message);
            }
        }
        self.entries = kept;
        (delivered, dropped)
    }

    /// Number of buffered messages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
