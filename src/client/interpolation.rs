//! Lag-compensated view reconstruction from buffered snapshots
//!
//! The render time trails the local clock by a fixed delay so that, most of
//! the time, two received snapshots straddle it. Only mover positions are
//! blended; everything else comes from the later snapshot as-is.

use std::collections::{HashMap, HashSet};

use crate::util::time::unix_secs_f64;
use crate::ws::protocol::{MoverSnapshot, WorldSnapshot};

use super::buffer::{BufferedSnapshot, SnapshotBuffer};

pub const DEFAULT_INTERPOLATION_DELAY: f64 = 0.1;

#[derive(Debug, Clone, Copy)]
pub struct Interpolator {
    delay: f64,
}

impl Interpolator {
    pub fn new(delay: f64) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> f64 {
        self.delay
    }

    pub fn render_time(&self, now: f64) -> f64 {
        now - self.delay
    }

    /// Interpolated state for the local clock, or `None` while fewer than two
    /// snapshots are buffered.
    pub fn sample(&self, buffer: &SnapshotBuffer) -> Option<WorldSnapshot> {
        self.sample_at(buffer, unix_secs_f64())
    }

    /// Same as [`sample`](Self::sample) with an explicit local clock reading
    pub fn sample_at(&self, buffer: &SnapshotBuffer, now: f64) -> Option<WorldSnapshot> {
        let render_time = self.render_time(now);
        let (before, after) = buffer.bracket(render_time)?;
        Some(interpolate_states(before, after, render_time))
    }
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new(DEFAULT_INTERPOLATION_DELAY)
    }
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Blend factor for `render_time` between `t1` and `t2`, clamped to `[0, 1]`
pub fn blend_factor(t1: f64, t2: f64, render_time: f64) -> f64 {
    if t1 == t2 {
        return 0.0;
    }
    ((render_time - t1) / (t2 - t1)).clamp(0.0, 1.0)
}

/// Build a fresh state between two snapshots.
///
/// Movers in both are position-blended; movers only in `after` appear as-is;
/// movers only in `before` are dropped. Pickups always come from `after`.
/// An id repeated within `after` is emitted once, from its first occurrence.
pub fn interpolate_states(
    before: &BufferedSnapshot,
    after: &BufferedSnapshot,
    render_time: f64,
) -> WorldSnapshot {
    let alpha = blend_factor(before.timestamp, after.timestamp, render_time);

    let earlier: HashMap<&str, &MoverSnapshot> = before
        .snapshot
        .players
        .iter()
        .map(|p| (p.id.as_str(), p))
        .collect();

    let mut seen_players = HashSet::new();
    let players = after
        .snapshot
        .players
        .iter()
        .filter(|p| seen_players.insert(p.id.as_str()))
        .map(|later| match earlier.get(later.id.as_str()) {
            Some(prev) => MoverSnapshot {
                x: lerp(prev.x, later.x, alpha),
                y: lerp(prev.y, later.y, alpha),
                ..later.clone()
            },
            None => later.clone(),
        })
        .collect();

    let mut seen_coins = HashSet::new();
    let coins = after
        .snapshot
        .coins
        .iter()
        .filter(|c| seen_coins.insert(c.id.as_str()))
        .cloned()
        .collect();

    WorldSnapshot {
        timestamp: render_time,
        players,
        coins,
    }
}
