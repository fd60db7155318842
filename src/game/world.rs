//! Authoritative world model: movers, pickups, bounds and clock

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::ws::protocol::Direction;

use super::physics::PhysicsSystem;

pub const MOVER_RADIUS: f64 = 20.0;
pub const MOVER_SPEED: f64 = 200.0;
pub const PICKUP_RADIUS: f64 = 10.0;

/// Distance from the world edge inside which movers spawn
pub const MOVER_SPAWN_INSET: f64 = 100.0;
/// Distance from the world edge inside which pickups spawn
pub const PICKUP_SPAWN_INSET: f64 = 50.0;

/// Pickup values and their relative weights
pub const PICKUP_VALUE_WEIGHTS: [(u32, u32); 3] = [(1, 3), (2, 1), (5, 1)];

pub const MOVER_COLORS: [[u8; 3]; 6] = [
    [255, 100, 100],
    [100, 255, 100],
    [100, 100, 255],
    [255, 255, 100],
    [255, 100, 255],
    [100, 255, 255],
];

/// A peer-controlled circle that moves and collects pickups
#[derive(Debug, Clone, PartialEq)]
pub struct Mover {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub score: u32,
    pub radius: f64,
    pub speed: f64,
    pub color: [u8; 3],
}

impl Mover {
    pub fn new(id: impl Into<String>, x: f64, y: f64, color: [u8; 3]) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            score: 0,
            radius: MOVER_RADIUS,
            speed: MOVER_SPEED,
            color,
        }
    }

    /// Point the mover along `direction` at its fixed speed.
    ///
    /// `Unrecognized` leaves the current velocity unchanged.
    pub fn set_velocity(&mut self, direction: Direction) {
        let speed = self.speed;
        let (vx, vy) = match direction {
            Direction::Up => (0.0, -speed),
            Direction::Down => (0.0, speed),
            Direction::Left => (-speed, 0.0),
            Direction::Right => (speed, 0.0),
            Direction::Stop => (0.0, 0.0),
            Direction::Unrecognized => return,
        };
        self.vx = vx;
        self.vy = vy;
    }
}

/// A stationary collectible
#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub value: u32,
    pub radius: f64,
}

impl Pickup {
    pub fn new(id: impl Into<String>, x: f64, y: f64, value: u32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            value,
            radius: PICKUP_RADIUS,
        }
    }
}

/// One pickup credited to one mover during a collision pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub mover_id: String,
    pub pickup_id: String,
    pub value: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("Mover {0} already exists")]
    DuplicateMover(String),
}

/// The authoritative world state (owned behind the server's single lock)
pub struct World {
    width: f64,
    height: f64,
    /// Authoritative clock, seconds; set by the server loop each tick
    clock: f64,
    /// Kept in join order, which is also the collision scan order
    movers: Vec<Mover>,
    pickups: Vec<Pickup>,
    rng: ChaCha8Rng,
}

impl World {
    pub fn new(width: f64, height: f64, seed: u64) -> Self {
        Self::with_rng(width, height, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy(width: f64, height: f64) -> Self {
        Self::with_rng(width, height, ChaCha8Rng::from_entropy())
    }

    fn with_rng(width: f64, height: f64, rng: ChaCha8Rng) -> Self {
        Self {
            width,
            height,
            clock: 0.0,
            movers: Vec::new(),
            pickups: Vec::new(),
            rng,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn set_clock(&mut self, timestamp: f64) {
        self.clock = timestamp;
    }

    pub fn movers(&self) -> &[Mover] {
        &self.movers
    }

    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    pub fn mover(&self, id: &str) -> Option<&Mover> {
        self.movers.iter().find(|m| m.id == id)
    }

    pub fn mover_mut(&mut self, id: &str) -> Option<&mut Mover> {
        self.movers.iter_mut().find(|m| m.id == id)
    }

    /// Create a mover for a newly joined peer at a random inset position
    pub fn spawn_mover(&mut self, id: impl Into<String>) -> Result<&Mover, WorldError> {
        let x = inset_coordinate(&mut self.rng, self.width, MOVER_SPAWN_INSET);
        let y = inset_coordinate(&mut self.rng, self.height, MOVER_SPAWN_INSET);
        let color = MOVER_COLORS
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(MOVER_COLORS[0]);

        self.insert_mover(Mover::new(id, x, y, color))?;
        Ok(&self.movers[self.movers.len() - 1])
    }

    pub fn insert_mover(&mut self, mover: Mover) -> Result<(), WorldError> {
        if self.mover(&mover.id).is_some() {
            return Err(WorldError::DuplicateMover(mover.id));
        }
        self.movers.push(mover);
        Ok(())
    }

    /// Remove a mover; absent ids are a no-op
    pub fn remove_mover(&mut self, id: &str) -> Option<Mover> {
        let idx = self.movers.iter().position(|m| m.id == id)?;
        Some(self.movers.remove(idx))
    }

    /// Apply a direction command to a mover. Returns false when the mover is gone.
    pub fn apply_command(&mut self, id: &str, direction: Direction) -> bool {
        match self.mover_mut(id) {
            Some(mover) => {
                mover.set_velocity(direction);
                true
            }
            None => false,
        }
    }

    /// Integrate every mover by `dt` seconds and clamp it inside the bounds
    pub fn advance(&mut self, dt: f64) {
        let dt = dt.max(0.0);
        for mover in &mut self.movers {
            mover.x = PhysicsSystem::step_axis(mover.x, mover.vx, dt, mover.radius, self.width);
            mover.y = PhysicsSystem::step_axis(mover.y, mover.vy, dt, mover.radius, self.height);
        }
    }

    /// Credit each overlapped pickup to the first overlapping mover in join
    /// order and remove it.
    pub fn resolve_collisions(&mut self) -> Vec<Collection> {
        let mut collected = Vec::new();
        let movers = &mut self.movers;

        self.pickups.retain(|pickup| {
            let winner = movers.iter_mut().find(|m| {
                PhysicsSystem::circles_overlap(m.x, m.y, m.radius, pickup.x, pickup.y, pickup.radius)
            });

            match winner {
                Some(mover) => {
                    mover.score = mover.score.saturating_add(pickup.value);
                    collected.push(Collection {
                        mover_id: mover.id.clone(),
                        pickup_id: pickup.id.clone(),
                        value: pickup.value,
                    });
                    false
                }
                None => true,
            }
        });

        collected
    }

    /// One simulation step: motion, then pickup resolution
    pub fn step(&mut self, dt: f64) -> Vec<Collection> {
        self.advance(dt);
        self.resolve_collisions()
    }

    /// Spawn one pickup at a random inset position with a weighted value
    pub fn spawn_pickup(&mut self) -> &Pickup {
        let x = inset_coordinate(&mut self.rng, self.width, PICKUP_SPAWN_INSET);
        let y = inset_coordinate(&mut self.rng, self.height, PICKUP_SPAWN_INSET);
        let value = PICKUP_VALUE_WEIGHTS
            .choose_weighted(&mut self.rng, |(_, weight)| *weight)
            .map(|(value, _)| *value)
            .unwrap_or(1);

        self.pickups
            .push(Pickup::new(Uuid::new_v4().to_string(), x, y, value));
        &self.pickups[self.pickups.len() - 1]
    }

    pub fn insert_pickup(&mut self, pickup: Pickup) {
        self.pickups.push(pickup);
    }
}

/// Uniform coordinate in `[inset, bound - inset]`, or the axis centre when the
/// bound is too small for the inset.
fn inset_coordinate(rng: &mut ChaCha8Rng, bound: f64, inset: f64) -> f64 {
    let lo = inset;
    let hi = bound - inset;
    if hi <= lo {
        bound / 2.0
    } else {
        rng.gen_range(lo..=hi)
    }
}
