//! Client-side ring of received world snapshots

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::ws::protocol::WorldSnapshot;

pub const DEFAULT_BUFFER_CAPACITY: usize = 30;

/// Buffer shared between the receive loop (producer) and the render step (consumer)
pub type SharedSnapshotBuffer = Arc<Mutex<SnapshotBuffer>>;

/// A received snapshot keyed by the sender's timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedSnapshot {
    pub timestamp: f64,
    pub snapshot: WorldSnapshot,
}

/// Bounded history of snapshots in arrival order.
///
/// Entries are never re-stamped or reordered; a full buffer evicts its oldest
/// entry.
#[derive(Debug)]
pub struct SnapshotBuffer {
    entries: VecDeque<BufferedSnapshot>,
    capacity: usize,
}

impl SnapshotBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn shared(capacity: usize) -> SharedSnapshotBuffer {
        Arc::new(Mutex::new(Self::new(capacity)))
    }

    /// Append without checking order
    pub fn add(&mut self, timestamp: f64, snapshot: WorldSnapshot) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(BufferedSnapshot {
            timestamp,
            snapshot,
        });
    }

    /// Append a snapshot under its own timestamp
    pub fn push(&mut self, snapshot: WorldSnapshot) {
        self.add(snapshot.timestamp, snapshot);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BufferedSnapshot> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&BufferedSnapshot> {
        self.entries.back()
    }

    /// The first adjacent pair in storage order with `t1 <= render_time <= t2`,
    /// or the two newest entries when no pair brackets it.
    pub fn bracket(&self, render_time: f64) -> Option<(&BufferedSnapshot, &BufferedSnapshot)> {
        let len = self.entries.len();
        if len < 2 {
            return None;
        }

        let found = (0..len - 1)
            .map(|i| (&self.entries[i], &self.entries[i + 1]))
            .find(|(a, b)| a.timestamp <= render_time && render_time <= b.timestamp);

        found.or(Some((&self.entries[len - 2], &self.entries[len - 1])))
    }
}

impl Default for SnapshotBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}
