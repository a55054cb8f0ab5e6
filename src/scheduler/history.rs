//! Recent tick history.
//!
//! Keeps the last few tick outcomes in memory for inspection and tests.
//! Fixed-capacity ring buffer; nothing is persisted.

use crate::scheduler::outcome::TickOutcome;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Default number of ticks retained.
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// One recorded tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickRecord {
    /// Sequence number, starting at 1.
    pub seq: u64,
    /// When the tick finished.
    pub at: DateTime<Utc>,
    pub outcome: TickOutcome,
}

/// Tick history with fixed capacity.
#[derive(Debug, Clone)]
pub struct TickHistory {
    /// Records in insertion order (oldest first).
    records: VecDeque<TickRecord>,
    max_records: usize,
    next_seq: u64,
}

impl TickHistory {
    /// Create a new history with the given capacity (at least one).
    #[must_use]
    pub fn new(max_records: usize) -> Self {
        let max_records = max_records.max(1);
        Self {
            records: VecDeque::with_capacity(max_records),
            max_records,
            next_seq: 1,
        }
    }

    /// Record an outcome, evicting the oldest if at capacity.
    pub fn push(&mut self, outcome: TickOutcome, at: DateTime<Utc>) -> TickRecord {
        let record = TickRecord {
            seq: self.next_seq,
            at,
            outcome,
        };
        self.next_seq = self.next_seq.wrapping_add(1);

        if self.records.len() >= self.max_records {
            self.records.pop_front();
        }
        self.records.push_back(record.clone());
        record
    }

    /// All records, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<TickRecord> {
        self.records.iter().cloned().collect()
    }

    /// Number of ticks run so far, including evicted ones.
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        self.next_seq.saturating_sub(1)
    }
}

impl Default for TickHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
