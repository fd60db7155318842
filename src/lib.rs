//! Coin Sync - authoritative position synchronization
//!
//! The server runs a fixed-tick world of movers and pickups and broadcasts
//! timestamped snapshots over WebSocket. Clients buffer those snapshots and
//! render a smoothed view a fixed delay behind their local clock.

pub mod app;
pub mod client;
pub mod config;
pub mod game;
pub mod http;
pub mod net;
pub mod util;
pub mod ws;
