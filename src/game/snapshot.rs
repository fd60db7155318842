//! Snapshot capture and size statistics

use crate::ws::protocol::{MoverSnapshot, PickupSnapshot, WorldSnapshot};

use super::world::{Mover, Pickup, World};

impl From<&Mover> for MoverSnapshot {
    fn from(m: &Mover) -> Self {
        Self {
            id: m.id.clone(),
            x: m.x,
            y: m.y,
            vx: m.vx,
            vy: m.vy,
            score: m.score,
            color: m.color,
            radius: m.radius,
        }
    }
}

impl From<&Pickup> for PickupSnapshot {
    fn from(p: &Pickup) -> Self {
        Self {
            id: p.id.clone(),
            x: p.x,
            y: p.y,
            value: p.value,
            radius: p.radius,
        }
    }
}

impl World {
    /// Capture every mover and pickup stamped with the world clock.
    ///
    /// Call under the same lock used for mutation so the capture is consistent.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            timestamp: self.clock(),
            players: self.movers().iter().map(MoverSnapshot::from).collect(),
            coins: self.pickups().iter().map(PickupSnapshot::from).collect(),
        }
    }
}

/// Running totals of serialized snapshots, for debug logging
#[derive(Debug, Default)]
pub struct SnapshotStats {
    pub total_snapshots: u64,
    pub total_bytes: u64,
    pub avg_players_per_snapshot: f64,
}

impl SnapshotStats {
    pub fn record(&mut self, player_count: usize, bytes: usize) {
        self.total_snapshots += 1;
        self.total_bytes += bytes as u64;

        // Running average
        let n = self.total_snapshots as f64;
        self.avg_players_per_snapshot =
            self.avg_players_per_snapshot * ((n - 1.0) / n) + (player_count as f64 / n);
    }

    pub fn avg_bytes(&self) -> u64 {
        self.total_bytes.checked_div(self.total_snapshots).unwrap_or(0)
    }
}
