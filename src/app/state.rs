//! Application state shared across routes and sessions

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;
use crate::game::session::Outbound;
use crate::game::{run_spawner, ServerLoop, SessionRegistry, SharedWorld, World, WorldError};
use crate::net::{Broadcaster, Delayed};
use crate::ws::protocol::{encode, Direction, ServerMsg};

/// Shared application state
///
/// Joins, leaves, commands and ticks all mutate the world through the one
/// `world` lock; registry changes on join and leave happen under it too.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub world: SharedWorld,
    pub sessions: Arc<SessionRegistry>,
    pub broadcaster: Arc<Broadcaster>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        let mut world = match config.world_seed {
            Some(seed) => World::new(config.world_width, config.world_height, seed),
            None => World::from_entropy(config.world_width, config.world_height),
        };
        for _ in 0..config.initial_coins {
            world.spawn_pickup();
        }

        let sessions = Arc::new(SessionRegistry::new());
        let broadcaster = Arc::new(Broadcaster::new(sessions.clone(), config.latency()));

        Self {
            config,
            world: Arc::new(Mutex::new(world)),
            sessions,
            broadcaster,
        }
    }

    /// Start the tick loop and the pickup spawner
    pub fn spawn_loops(&self) -> (JoinHandle<()>, JoinHandle<()>) {
        let server_loop = ServerLoop::new(
            self.world.clone(),
            self.broadcaster.clone(),
            self.config.tick_rate,
        );
        let ticks = tokio::spawn(server_loop.run());
        let spawner = tokio::spawn(run_spawner(
            self.world.clone(),
            self.config.coin_spawn_period(),
        ));
        (ticks, spawner)
    }

    /// Admit a new peer: allocate its identity, create its mover, queue its
    /// welcome and register it for broadcasts.
    ///
    /// The welcome is queued before registration so it is always the first
    /// message on the peer's queue.
    pub fn connect_peer(&self, outbound: mpsc::Sender<Outbound>) -> Result<String, WorldError> {
        let player_id = self.sessions.allocate_id();

        let mut world = self.world.lock();
        world.spawn_mover(player_id.clone())?;

        match encode(&ServerMsg::welcome(player_id.clone())) {
            Ok(json) => {
                if outbound
                    .try_send(Delayed::after(self.broadcaster.latency(), json.into()))
                    .is_err()
                {
                    warn!(player_id = %player_id, "Could not queue welcome");
                }
            }
            Err(e) => warn!(player_id = %player_id, error = %e, "Failed to encode welcome"),
        }

        self.sessions.register(player_id.clone(), outbound);
        let players = world.movers().len();
        drop(world);

        info!(player_id = %player_id, players, "Player connected");
        Ok(player_id)
    }

    /// Remove a peer's mover and registry entry; repeated calls are no-ops
    pub fn disconnect_peer(&self, player_id: &str) -> bool {
        let mut world = self.world.lock();
        let removed_mover = world.remove_mover(player_id).is_some();
        let removed_session = self.sessions.unregister(player_id);
        drop(world);

        if removed_mover || removed_session {
            info!(player_id = %player_id, "Player disconnected");
        }
        removed_mover || removed_session
    }

    /// Apply a direction command right away, outside the tick cadence.
    /// Returns false when the peer's mover no longer exists.
    pub fn apply_command(&self, player_id: &str, direction: Direction) -> bool {
        self.world.lock().apply_command(player_id, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::decode_server;

    fn state() -> AppState {
        AppState::new(Config {
            artificial_latency: 0.0,
            initial_coins: 3,
            world_seed: Some(4),
            ..Config::default()
        })
    }

    #[test]
    fn initial_coins_are_spawned() {
        assert_eq!(state().world.lock().pickups().len(), 3);
    }

    #[test]
    fn connect_creates_mover_and_welcome() {
        let state = state();
        let (tx, mut rx) = mpsc::channel(8);

        let id = state.connect_peer(tx).unwrap();

        assert!(state.world.lock().mover(&id).is_some());
        assert!(state.sessions.contains(&id));
        match decode_server(&rx.try_recv().unwrap().item).unwrap() {
            ServerMsg::Welcome { player_id, .. } => assert_eq!(player_id, id),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn welcome_precedes_first_broadcast() {
        let state = state();
        let (tx, mut rx) = mpsc::channel(8);
        state.connect_peer(tx).unwrap();

        let snapshot = state.world.lock().snapshot();
        state.broadcaster.broadcast(snapshot);

        let first = decode_server(&rx.try_recv().unwrap().item).unwrap();
        let second = decode_server(&rx.try_recv().unwrap().item).unwrap();
        assert!(matches!(first, ServerMsg::Welcome { .. }));
        assert!(matches!(second, ServerMsg::State(_)));
    }

    #[test]
    fn commands_apply_immediately() {
        let state = state();
        let (tx, _rx) = mpsc::channel(8);
        let id = state.connect_peer(tx).unwrap();

        assert!(state.apply_command(&id, Direction::Down));
        assert_eq!(state.world.lock().mover(&id).unwrap().vy, 200.0);

        assert!(state.apply_command(&id, Direction::Unrecognized));
        assert_eq!(state.world.lock().mover(&id).unwrap().vy, 200.0);
    }

    #[test]
    fn disconnect_is_idempotent() {
        let state = state();
        let (tx, _rx) = mpsc::channel(8);
        let id = state.connect_peer(tx).unwrap();

        assert!(state.disconnect_peer(&id));
        assert!(!state.disconnect_peer(&id));
        assert!(state.world.lock().mover(&id).is_none());
        assert!(!state.sessions.contains(&id));
        assert!(!state.apply_command(&id, Direction::Up));
    }
}
