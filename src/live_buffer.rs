// Bounded history of snapshots for the live (latest) view.

use std::collections::VecDeque;

use crate::models::MetricSnapshot;

/// Default number of snapshots kept for the live charts.
pub const DEFAULT_CAPACITY: usize = 120;

/// FIFO of the most recent snapshots, oldest first.
///
/// Ingesting the same latest record twice (same `id`) is a no-op, so repeated
/// polling of an unchanged source does not pad the history.
#[derive(Debug, Clone)]
pub struct LiveBuffer {
    capacity: usize,
    entries: VecDeque<MetricSnapshot>,
    last_id: Option<i64>,
}

impl Default for LiveBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LiveBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            last_id: None,
        }
    }

    /// Appends `snapshot` unless its id matches the last ingested id.
    /// Returns whether the buffer changed.
    pub fn ingest(&mut self, snapshot: MetricSnapshot) -> bool {
        if snapshot.id.is_some() && snapshot.id == self.last_id {
            return false;
        }
        self.last_id = snapshot.id;
        self.entries.push_back(snapshot);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        true
    }

    pub fn snapshots(&self) -> impl ExactSizeIterator<Item = &MetricSnapshot> + '_ {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&MetricSnapshot> {
        self.entries.back()
    }

    pub fn last_id(&self) -> Option<i64> {
        self.last_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
