//! Outbound fan-out and latency emulation

pub mod broadcast;
pub mod delay;

pub use broadcast::{BroadcastReport, Broadcaster};
pub use delay::Delayed;
