//! Server end of the command channel
//!
//! This module tracks connected peers and buffers their commands so the
//! tick loop can drain them in per-sender sequence order. There is no
//! ordering guarantee across peers, no acknowledgement and no retry;
//! stale or duplicate sequences are dropped, which gives the at-most-once
//! semantics the transport promises.

use log::info;
use shared::Command;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A buffered command waiting for the next tick.
#[derive(Debug, Clone)]
pub struct QueuedCommand {
    pub sequence: u32,
    pub command: Command,
}

/// One connected peer and its pending commands.
#[derive(Debug)]
pub struct Peer {
    pub id: u32,
    pub addr: SocketAddr,
    /// Last time any packet arrived from this peer.
    pub last_seen: Instant,
    /// Highest sequence already handed to the tick loop.
    pub last_processed: u32,
    pub pending: Vec<QueuedCommand>,
}

impl Peer {
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
            last_processed: 0,
            pending: Vec::new(),
        }
    }

    /// Buffers a command, keeping the queue in sequence order so commands
    /// are applied in the order the peer sent them even if the datagrams
    /// arrived shuffled.
    pub fn queue(&mut self, sequence: u32, command: Command) {
        self.last_seen = Instant::now();
        self.pending.push(QueuedCommand { sequence, command });
        self.pending.sort_by_key(|qc| qc.sequence);
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Tracks all connected peers, enforces capacity, and drains commands.
pub struct CommandChannel {
    peers: HashMap<u32, Peer>,
    next_peer_id: u32,
    max_peers: usize,
}

impl CommandChannel {
    pub fn new(max_peers: usize) -> Self {
        Self {
            peers: HashMap::new(),
            next_peer_id: 1,
            max_peers,
        }
    }

    /// Registers a new peer, returning its id, or `None` at capacity.
    pub fn add_peer(&mut self, addr: SocketAddr) -> Option<u32> {
        if self.peers.len() >= self.max_peers {
            return None;
        }

        let peer_id = self.next_peer_id;
        self.next_peer_id += 1;

        info!("Peer {} connected from {}", peer_id, addr);
        self.peers.insert(peer_id, Peer::new(peer_id, addr));
        Some(peer_id)
    }

    pub fn remove_peer(&mut self, peer_id: &u32) -> bool {
        if let Some(peer) = self.peers.remove(peer_id) {
            info!("Peer {} disconnected", peer.id);
            true
        } else {
            false
        }
    }

    pub fn find_peer_by_addr(&self, addr: SocketAddr) -> Option<u32> {
        self.peers
            .iter()
            .find(|(_, peer)| peer.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Buffers a command for the given peer. Returns false for unknown
    /// peers (the datagram is simply dropped).
    pub fn queue_command(&mut self, peer_id: u32, sequence: u32, command: Command) -> bool {
        if let Some(peer) = self.peers.get_mut(&peer_id) {
            peer.queue(sequence, command);
            true
        } else {
            false
        }
    }

    /// Drains every pending command, per-sender in sequence order.
    ///
    /// Commands at or below a peer's last processed sequence are dropped
    /// (duplicate or stale delivery). The relative order of different
    /// peers' commands is unspecified.
    pub fn drain_ordered(&mut self) -> Vec<(u32, Command)> {
        let mut drained = Vec::new();

        for (peer_id, peer) in &mut self.peers {
            for queued in peer.pending.drain(..) {
                if queued.sequence > peer.last_processed {
                    peer.last_processed = queued.sequence;
                    drained.push((*peer_id, queued.command));
                }
            }
        }

        drained
    }

    /// Removes peers that have gone quiet and reports their ids so the
    /// caller can tear down their player state.
    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<u32> {
        let timed_out: Vec<u32> = self
            .peers
            .iter()
            .filter(|(_, peer)| peer.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        for peer_id in &timed_out {
            self.remove_peer(peer_id);
        }

        timed_out
    }

    /// All peer ids and addresses, for state broadcasts.
    pub fn peer_addrs(&self) -> Vec<(u32, SocketAddr)> {
        self.peers
            .iter()
            .map(|(id, peer)| (*id, peer.addr))
            .collect()
    }

    /// Peer ids in join order (ids are assigned monotonically).
    pub fn peer_ids_in_join_order(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.peers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
