//! Session registry: which peers are connected and how to reach them

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::net::Delayed;

/// One serialized message on its way to a peer
pub type Outbound = Delayed<Arc<str>>;

/// Handle for routing messages to a connected peer
#[derive(Clone, Debug)]
pub struct PeerHandle {
    pub player_id: String,
    pub outbound: mpsc::Sender<Outbound>,
    join_seq: u64,
}

/// Registry of connected peers
pub struct SessionRegistry {
    peers: DashMap<String, PeerHandle>,
    next_seq: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            peers: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Allocate a fresh, never reused player identity
    pub fn allocate_id(&self) -> String {
        format!("player_{}", Uuid::new_v4().simple())
    }

    pub fn register(&self, player_id: String, outbound: mpsc::Sender<Outbound>) {
        let join_seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.peers.insert(
            player_id.clone(),
            PeerHandle {
                player_id,
                outbound,
                join_seq,
            },
        );
    }

    /// Remove a peer. Returns false when it was already gone.
    pub fn unregister(&self, player_id: &str) -> bool {
        self.peers.remove(player_id).is_some()
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.peers.contains_key(player_id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Snapshot of every registered peer, in join order.
    ///
    /// The map guards are released before this returns, so callers may
    /// unregister peers while walking the result.
    pub fn peers(&self) -> Vec<PeerHandle> {
        let mut peers: Vec<PeerHandle> = self.peers.iter().map(|p| p.value().clone()).collect();
        peers.sort_by_key(|p| p.join_seq);
        peers
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
