//! Time utilities for the simulation clock

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Current Unix time in seconds with sub-second precision.
///
/// Snapshots are stamped with this value on the server, and the client uses
/// the same clock to pick its render time.
pub fn unix_secs_f64() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64()
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Duration of one period at `rate` per second.
pub fn period_for_rate(rate: u32) -> Duration {
    Duration::from_secs_f64(1.0 / rate.max(1) as f64)
}

/// Convert a non-negative number of seconds into a `Duration`.
///
/// Negative and non-finite inputs collapse to zero.
pub fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_matches_rate() {
        assert_eq!(period_for_rate(4), Duration::from_millis(250));
        // zero rate is treated as one tick per second
        assert_eq!(period_for_rate(0), Duration::from_secs(1));
    }

    #[test]
    fn negative_seconds_are_zero() {
        assert_eq!(secs_to_duration(-1.0), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::NAN), Duration::ZERO);
        assert_eq!(secs_to_duration(0.5), Duration::from_millis(500));
    }

    #[test]
    fn wall_clock_is_after_epoch() {
        assert!(unix_secs_f64() > 1_600_000_000.0);
    }
}
