//! WebSocket transport: wire types and the per-peer session

pub mod handler;
pub mod protocol;
