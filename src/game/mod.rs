//! Game simulation modules

pub mod physics;
pub mod server_loop;
pub mod session;
pub mod snapshot;
pub mod world;

pub use server_loop::{run_spawner, ServerLoop};
pub use session::{PeerHandle, SessionRegistry};
pub use world::{Collection, Mover, Pickup, World, WorldError};

use std::sync::Arc;

use parking_lot::Mutex;

/// The single owned world, shared by the tick loop and every peer session
pub type SharedWorld = Arc<Mutex<World>>;
