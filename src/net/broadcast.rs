//! Snapshot fan-out to every registered peer

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use crate::game::session::SessionRegistry;
use crate::game::snapshot::SnapshotStats;
use crate::ws::protocol::{encode, ServerMsg, WorldSnapshot};

use super::Delayed;

/// Outcome of one broadcast
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Peers whose queue accepted the snapshot
    pub queued: usize,
    /// Peers whose queue was full; they miss this snapshot only
    pub dropped: usize,
    /// Peers whose queue was closed and that were unregistered
    pub reaped: usize,
}

/// Serializes snapshots once and queues them on each peer's outbound channel.
///
/// Queueing never waits: a full peer misses the snapshot and a closed peer is
/// unregistered, neither affects anyone else.
pub struct Broadcaster {
    sessions: Arc<SessionRegistry>,
    latency: Duration,
    stats: Mutex<SnapshotStats>,
}

impl Broadcaster {
    pub fn new(sessions: Arc<SessionRegistry>, latency: Duration) -> Self {
        Self {
            sessions,
            latency,
            stats: Mutex::new(SnapshotStats::default()),
        }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Deliver one state message to every currently registered peer
    pub fn broadcast(&self, snapshot: WorldSnapshot) -> BroadcastReport {
        let player_count = snapshot.players.len();
        let text: Arc<str> = match encode(&ServerMsg::State(snapshot)) {
            Ok(json) => json.into(),
            Err(e) => {
                error!(error = %e, "Failed to encode snapshot");
                return BroadcastReport::default();
            }
        };

        let mut report = BroadcastReport::default();
        for peer in self.sessions.peers() {
            match peer
                .outbound
                .try_send(Delayed::after(self.latency, text.clone()))
            {
                Ok(()) => report.queued += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(player_id = %peer.player_id, "Peer queue full, dropping snapshot");
                    report.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    if self.sessions.unregister(&peer.player_id) {
                        info!(player_id = %peer.player_id, "Reaped closed peer");
                    }
                    report.reaped += 1;
                }
            }
        }

        let mut stats = self.stats.lock();
        stats.record(player_count, text.len());
        if stats.total_snapshots % 300 == 0 {
            debug!(
                snapshots = stats.total_snapshots,
                avg_bytes = stats.avg_bytes(),
                avg_players = stats.avg_players_per_snapshot,
                "Snapshot stats"
            );
        }

        report
    }

    pub fn snapshots_sent(&self) -> u64 {
        self.stats.lock().total_snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::session::Outbound;
    use crate::ws::protocol::{decode_server, MoverSnapshot};
    use tokio::sync::mpsc;

    fn snapshot(timestamp: f64) -> WorldSnapshot {
        WorldSnapshot {
            timestamp,
            players: vec![MoverSnapshot {
                id: "p1".into(),
                x: 1.0,
                y: 2.0,
                vx: 0.0,
                vy: 0.0,
                score: 0,
                color: [1, 2, 3],
                radius: 20.0,
            }],
            coins: Vec::new(),
        }
    }

    fn register(sessions: &SessionRegistry, id: &str, capacity: usize) -> mpsc::Receiver<Outbound> {
        let (tx, rx) = mpsc::channel(capacity);
        sessions.register(id.to_string(), tx);
        rx
    }

    #[test]
    fn every_peer_gets_the_same_text() {
        let sessions = Arc::new(SessionRegistry::new());
        let mut a = register(&sessions, "a", 4);
        let mut b = register(&sessions, "b", 4);
        let broadcaster = Broadcaster::new(sessions, Duration::ZERO);

        let report = broadcaster.broadcast(snapshot(3.0));

        assert_eq!(report.queued, 2);
        let ta = a.try_recv().unwrap().item;
        let tb = b.try_recv().unwrap().item;
        assert_eq!(ta, tb);
        match decode_server(&ta).unwrap() {
            ServerMsg::State(s) => assert_eq!(s, snapshot(3.0)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(broadcaster.snapshots_sent(), 1);
    }

    #[test]
    fn full_peer_does_not_block_others() {
        let sessions = Arc::new(SessionRegistry::new());
        let _slow = register(&sessions, "slow", 1);
        let mut fast = register(&sessions, "fast", 8);
        let broadcaster = Broadcaster::new(sessions.clone(), Duration::ZERO);

        broadcaster.broadcast(snapshot(1.0));
        let report = broadcaster.broadcast(snapshot(2.0));

        assert_eq!(report.dropped, 1);
        assert_eq!(report.queued, 1);
        assert!(sessions.contains("slow"));
        assert!(fast.try_recv().is_ok());
        assert!(fast.try_recv().is_ok());
    }

    #[test]
    fn closed_peer_is_reaped() {
        let sessions = Arc::new(SessionRegistry::new());
        let gone = register(&sessions, "gone", 4);
        let mut alive = register(&sessions, "alive", 4);
        drop(gone);
        let broadcaster = Broadcaster::new(sessions.clone(), Duration::ZERO);

        let report = broadcaster.broadcast(snapshot(1.0));

        assert_eq!(report.reaped, 1);
        assert_eq!(report.queued, 1);
        assert!(!sessions.contains("gone"));
        assert!(alive.try_recv().is_ok());

        let report = broadcaster.broadcast(snapshot(2.0));
        assert_eq!(report.reaped, 0);
    }

    #[test]
    fn latency_sets_deadline() {
        let sessions = Arc::new(SessionRegistry::new());
        let mut rx = register(&sessions, "p", 4);
        let broadcaster = Broadcaster::new(sessions, Duration::from_secs(30));

        broadcaster.broadcast(snapshot(1.0));

        assert!(!rx.try_recv().unwrap().is_due());
    }

    #[test]
    fn no_peers_is_fine() {
        let broadcaster = Broadcaster::new(Arc::new(SessionRegistry::new()), Duration::ZERO);
        assert_eq!(broadcaster.broadcast(snapshot(1.0)), BroadcastReport::default());
    }
}
