//! Authoritative tick loop and pickup spawn timer

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::net::{BroadcastReport, Broadcaster};
use crate::util::time::{period_for_rate, unix_secs_f64};
use crate::ws::protocol::WorldSnapshot;

use super::SharedWorld;

/// Runs the simulation at a fixed rate and hands each snapshot to the broadcaster
pub struct ServerLoop {
    world: SharedWorld,
    broadcaster: Arc<Broadcaster>,
    tick_rate: u32,
}

impl ServerLoop {
    pub fn new(world: SharedWorld, broadcaster: Arc<Broadcaster>, tick_rate: u32) -> Self {
        Self {
            world,
            broadcaster,
            tick_rate,
        }
    }

    /// Run the authoritative tick loop until the process ends
    pub async fn run(self) {
        info!(tick_rate = self.tick_rate, "Server loop started");

        let mut tick_interval = interval(period_for_rate(self.tick_rate));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut last = Instant::now();
        loop {
            tick_interval.tick().await;

            // dt follows the wall clock so an overrun tick still moves movers the right distance
            let now = Instant::now();
            let dt = now.duration_since(last).as_secs_f64();
            last = now;

            let report = self.tick_and_broadcast(dt);
            if report.dropped > 0 || report.reaped > 0 {
                debug!(
                    dropped = report.dropped,
                    reaped = report.reaped,
                    "Snapshot not delivered to every peer"
                );
            }
        }
    }

    /// Advance the world by `dt`, stamp it with `timestamp` and capture it.
    ///
    /// Mutation and capture share one critical section.
    pub fn tick(&self, dt: f64, timestamp: f64) -> WorldSnapshot {
        let mut world = self.world.lock();
        let collected = world.step(dt);
        world.set_clock(timestamp);
        let snapshot = world.snapshot();
        drop(world);

        for c in &collected {
            debug!(
                player_id = %c.mover_id,
                coin_id = %c.pickup_id,
                value = c.value,
                "Coin collected"
            );
        }

        snapshot
    }

    /// Tick once, stamped with the current wall clock, and broadcast
    pub fn tick_and_broadcast(&self, dt: f64) -> BroadcastReport {
        let snapshot = self.tick(dt, unix_secs_f64());
        self.broadcaster.broadcast(snapshot)
    }
}

/// Spawn one pickup every `period`, independent of the tick cadence
pub async fn run_spawner(world: SharedWorld, period: Duration) {
    let mut spawn_interval = interval(period);
    spawn_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick of a tokio interval fires immediately
    spawn_interval.tick().await;

    loop {
        spawn_interval.tick().await;
        let mut world = world.lock();
        let pickup = world.spawn_pickup();
        debug!(
            coin_id = %pickup.id,
            value = pickup.value,
            x = pickup.x,
            y = pickup.y,
            "Coin spawned"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::session::SessionRegistry;
    use crate::game::world::{Mover, Pickup, World, MOVER_COLORS};
    use crate::ws::protocol::Direction;
    use parking_lot::Mutex;

    fn server_loop(world: World) -> (ServerLoop, SharedWorld, Arc<SessionRegistry>) {
        let world = Arc::new(Mutex::new(world));
        let sessions = Arc::new(SessionRegistry::new());
        let broadcaster = Arc::new(Broadcaster::new(sessions.clone(), Duration::ZERO));
        (
            ServerLoop::new(world.clone(), broadcaster, 30),
            world,
            sessions,
        )
    }

    #[test]
    fn tick_moves_collects_and_stamps() {
        let mut world = World::new(800.0, 600.0, 11);
        world
            .insert_mover(Mover::new("p", 100.0, 100.0, MOVER_COLORS[0]))
            .unwrap();
        world.apply_command("p", Direction::Right);
        world.insert_pickup(Pickup::new("coin", 125.0, 100.0, 5));
        let (server_loop, world, _) = server_loop(world);

        let snapshot = server_loop.tick(0.1, 1234.5);

        assert_eq!(snapshot.timestamp, 1234.5);
        assert!((snapshot.players[0].x - 120.0).abs() < 1e-9);
        assert_eq!(snapshot.players[0].score, 5);
        assert!(snapshot.coins.is_empty());
        assert_eq!(world.lock().clock(), 1234.5);
    }

    #[test]
    fn tick_and_broadcast_reaches_peers() {
        let (server_loop, _, sessions) = server_loop(World::new(800.0, 600.0, 1));
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        sessions.register("p".to_string(), tx);

        let report = server_loop.tick_and_broadcast(0.0);

        assert_eq!(report.queued, 1);
        assert!(rx.try_recv().unwrap().item.contains("\"type\":\"state\""));
    }

    #[tokio::test]
    async fn spawner_adds_pickups() {
        let world = Arc::new(Mutex::new(World::new(800.0, 600.0, 5)));
        let handle = tokio::spawn(run_spawner(world.clone(), Duration::from_millis(20)));

        tokio::time::sleep(Duration::from_millis(110)).await;
        handle.abort();

        let count = world.lock().pickups().len();
        assert!(count >= 2, "spawned {count}");
    }
}
