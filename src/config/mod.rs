//! Configuration module - environment variable parsing

mod client;

pub use client::ClientConfig;

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::util::time::secs_to_duration;

/// Server configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Seconds between pickup spawns
    pub coin_spawn_interval: f64,
    /// Pickups placed before the first tick
    pub initial_coins: usize,
    /// Injected one-way latency in seconds
    pub artificial_latency: f64,

    pub world_width: f64,
    pub world_height: f64,
    /// Fixed RNG seed; random when unset
    pub world_seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // PORT (set by most hosts) wins over SERVER_PORT
        let host = lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(port) => port,
            None => lookup("SERVER_PORT").unwrap_or_else(|| "8765".to_string()),
        };
        let server_addr = format!("{}:{}", host, port)
            .parse()
            .map_err(|_| ConfigError::InvalidAddress)?;

        let config = Self {
            server_addr,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            tick_rate: parse_or(&lookup, "TICK_RATE", 30)?,
            coin_spawn_interval: parse_or(&lookup, "COIN_SPAWN_INTERVAL", 3.0)?,
            initial_coins: parse_or(&lookup, "INITIAL_COINS", 5)?,
            artificial_latency: parse_or(&lookup, "ARTIFICIAL_LATENCY", 0.2)?,
            world_width: parse_or(&lookup, "WORLD_WIDTH", 800.0)?,
            world_height: parse_or(&lookup, "WORLD_HEIGHT", 600.0)?,
            world_seed: lookup("WORLD_SEED")
                .map(|raw| raw.parse().map_err(|_| ConfigError::Invalid("WORLD_SEED", raw)))
                .transpose()?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid("TICK_RATE", self.tick_rate.to_string()));
        }
        if !(self.coin_spawn_interval.is_finite() && self.coin_spawn_interval > 0.0) {
            return Err(ConfigError::Invalid(
                "COIN_SPAWN_INTERVAL",
                self.coin_spawn_interval.to_string(),
            ));
        }
        if !(self.artificial_latency.is_finite() && self.artificial_latency >= 0.0) {
            return Err(ConfigError::Invalid(
                "ARTIFICIAL_LATENCY",
                self.artificial_latency.to_string(),
            ));
        }
        if !(self.world_width.is_finite() && self.world_width > 0.0) {
            return Err(ConfigError::Invalid("WORLD_WIDTH", self.world_width.to_string()));
        }
        if !(self.world_height.is_finite() && self.world_height > 0.0) {
            return Err(ConfigError::Invalid("WORLD_HEIGHT", self.world_height.to_string()));
        }
        Ok(())
    }

    pub fn latency(&self) -> Duration {
        secs_to_duration(self.artificial_latency)
    }

    pub fn coin_spawn_period(&self) -> Duration {
        secs_to_duration(self.coin_spawn_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 8765)),
            log_level: "info".to_string(),
            tick_rate: 30,
            coin_spawn_interval: 3.0,
            initial_coins: 5,
            artificial_latency: 0.2,
            world_width: 800.0,
            world_height: 600.0,
            world_seed: None,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(key, raw)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),

    #[error("Invalid server address format")]
    InvalidAddress,
}
