//! Latency injection for per-peer queues
//!
//! Every queued item carries an absolute delivery deadline fixed when it was
//! enqueued. The draining task sleeps until that deadline, so items sharing a
//! latency never wait behind each other's delay and peers never share a timer.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// An item that must not be handed on before `deliver_at`
#[derive(Debug, Clone)]
pub struct Delayed<T> {
    pub deliver_at: Instant,
    pub item: T,
}

impl<T> Delayed<T> {
    pub fn after(latency: Duration, item: T) -> Self {
        Self {
            deliver_at: Instant::now() + latency,
            item,
        }
    }

    pub fn is_due(&self) -> bool {
        Instant::now() >= self.deliver_at
    }

    /// Wait for the deadline and release the item
    pub async fn ready(self) -> T {
        sleep_until(self.deliver_at).await;
        self.item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_latency_is_due() {
        assert!(Delayed::after(Duration::ZERO, 1).is_due());
        assert!(!Delayed::after(Duration::from_secs(60), 1).is_due());
    }

    #[tokio::test]
    async fn ready_waits_for_deadline() {
        let start = Instant::now();
        let item = Delayed::after(Duration::from_millis(30), "state").ready().await;
        assert_eq!(item, "state");
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn deadlines_do_not_accumulate() {
        let start = Instant::now();
        let queued: Vec<_> = (0..5)
            .map(|i| Delayed::after(Duration::from_millis(40), i))
            .collect();

        let mut seen = Vec::new();
        for d in queued {
            seen.push(d.ready().await);
        }

        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        // five items behind one 40ms latency, not five times 40ms
        assert!(start.elapsed() < Duration::from_millis(150));
    }
}
