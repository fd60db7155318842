//! Command-line configuration for the viewer client

use std::time::Duration;

use clap::Parser;

use crate::util::time::{period_for_rate, secs_to_duration};

#[derive(Parser, Debug, Clone)]
#[command(name = "coin-sync-client", about = "Headless interpolating viewer")]
pub struct ClientConfig {
    /// Server WebSocket URL
    #[arg(default_value = "ws://127.0.0.1:8765/ws")]
    pub url: String,

    /// Seconds the render time trails the local clock
    #[arg(long, default_value_t = 0.1)]
    pub interpolation_delay: f64,

    /// Snapshots kept for interpolation
    #[arg(long, default_value_t = 30)]
    pub buffer_size: usize,

    /// Render steps per second
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Seconds between rendered-view reports
    #[arg(long, default_value_t = 1.0)]
    pub report_interval: f64,

    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl ClientConfig {
    pub fn frame_period(&self) -> Duration {
        period_for_rate(self.fps)
    }

    pub fn report_period(&self) -> Duration {
        secs_to_duration(self.report_interval).max(self.frame_period())
    }
}
