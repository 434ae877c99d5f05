//! Server network layer handling UDP communications and the tick loop

use crate::combat;
use crate::commands::CommandChannel;
use crate::game::AuthorityState;
use crate::pickup::{self, Pickup};
use crate::session::{RosterEntry, SessionContext, SessionSpawner};
use crate::spawn::{SpawnCoordinator, SpawnError};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Command, Packet, Role, Vec3, COLOR_PALETTE, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

const PEER_TIMEOUT: Duration = Duration::from_secs(5);

/// Messages sent from network tasks to the main tick loop
#[derive(Debug)]
pub enum ServerEvent {
    PacketReceived { packet: Packet, addr: SocketAddr },
    PeerTimeout { peer_id: u32 },
}

/// Messages sent from the tick loop to the network sender task
#[derive(Debug)]
pub enum Outgoing {
    Send { packet: Packet, addr: SocketAddr },
    Broadcast { packet: Packet },
}

/// The authority node: lobby, session spawn, fixed-step loop, broadcast.
pub struct Server {
    socket: Arc<UdpSocket>,
    peers: Arc<RwLock<CommandChannel>>,
    state: AuthorityState,
    spawns: SpawnCoordinator,
    pickups: Vec<Pickup>,
    expected_players: usize,
    session_started: bool,
    tick_duration: Duration,

    event_tx: mpsc::UnboundedSender<ServerEvent>,
    event_rx: mpsc::UnboundedReceiver<ServerEvent>,
    out_tx: mpsc::UnboundedSender<Outgoing>,
    out_rx: mpsc::UnboundedReceiver<Outgoing>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        expected_players: usize,
        spawn_points: Vec<Vec3>,
        pickups: Vec<Pickup>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Authority listening on {}", addr);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        let mut spawns = SpawnCoordinator::new();
        spawns.refresh(spawn_points);

        Ok(Server {
            socket,
            peers: Arc::new(RwLock::new(CommandChannel::new(expected_players))),
            state: AuthorityState::new(Role::Authority),
            spawns,
            pickups,
            expected_players,
            session_started: false,
            tick_duration,
            event_tx,
            event_rx,
            out_tx,
            out_rx,
        })
    }

    /// Spawns the task that continuously listens for incoming datagrams
    async fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 8192];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if event_tx
                                .send(ServerEvent::PacketReceived { packet, addr })
                                .is_err()
                            {
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns the task that drains the outgoing packet queue
    async fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let peers = Arc::clone(&self.peers);
        let mut out_rx = std::mem::replace(&mut self.out_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                match message {
                    Outgoing::Send { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    Outgoing::Broadcast { packet } => {
                        let peer_addrs = {
                            let peers_guard = peers.read().await;
                            peers_guard.peer_addrs()
                        };

                        for (peer_id, addr) in peer_addrs {
                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to peer {}: {}", peer_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns the task that watches for quiet peers
    async fn spawn_timeout_checker(&self) {
        let peers = Arc::clone(&self.peers);
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut peers_guard = peers.write().await;
                    peers_guard.check_timeouts(PEER_TIMEOUT)
                };

                for peer_id in timed_out {
                    if event_tx.send(ServerEvent::PeerTimeout { peer_id }).is_err() {
                        return;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.out_tx.send(Outgoing::Send { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn broadcast_packet(&self, packet: Packet) {
        if let Err(e) = self.out_tx.send(Outgoing::Broadcast { packet }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                if client_version != PROTOCOL_VERSION {
                    warn!(
                        "Refusing peer at {} with protocol version {}",
                        addr, client_version
                    );
                    self.send_packet(
                        Packet::Disconnected {
                            reason: "Protocol version mismatch".to_string(),
                        },
                        addr,
                    );
                    return;
                }

                let peer_id = {
                    let mut peers = self.peers.write().await;
                    if let Some(existing) = peers.find_peer_by_addr(addr) {
                        // Reconnect from the same address keeps the slot.
                        Some(existing)
                    } else {
                        peers.add_peer(addr)
                    }
                };

                match peer_id {
                    Some(peer_id) => {
                        self.send_packet(Packet::Connected { client_id: peer_id }, addr);

                        let connected = self.peers.read().await.len();
                        info!(
                            "Lobby: {}/{} players connected",
                            connected, self.expected_players
                        );
                        if !self.session_started && connected == self.expected_players {
                            if let Err(e) = self.start_session().await {
                                error!("Cannot start session: {}", e);
                            }
                        }
                    }
                    None => {
                        self.send_packet(
                            Packet::Disconnected {
                                reason: "Session full".to_string(),
                            },
                            addr,
                        );
                    }
                }
            }

            Packet::Command { sequence, command } => {
                let peer_id = {
                    let peers = self.peers.read().await;
                    peers.find_peer_by_addr(addr)
                };

                if let Some(peer_id) = peer_id {
                    let mut peers = self.peers.write().await;
                    peers.queue_command(peer_id, sequence, command);
                } else {
                    debug!("Command from unknown address {}", addr);
                }
            }

            Packet::Disconnect => {
                let peer_id = {
                    let peers = self.peers.read().await;
                    peers.find_peer_by_addr(addr)
                };

                if let Some(peer_id) = peer_id {
                    let mut peers = self.peers.write().await;
                    peers.remove_peer(&peer_id);
                    self.state.remove_player(&peer_id);
                }
            }

            _ => {
                warn!("Unexpected packet type from {}", addr);
            }
        }
    }

    /// Builds the roster from the connected peers in join order and
    /// spawns one player per entry.
    async fn start_session(&mut self) -> Result<(), SpawnError> {
        let roster: Vec<RosterEntry> = {
            let peers = self.peers.read().await;
            peers
                .peer_ids_in_join_order()
                .into_iter()
                .enumerate()
                .map(|(index, client_id)| RosterEntry {
                    client_id,
                    color: COLOR_PALETTE[index % COLOR_PALETTE.len()],
                })
                .collect()
        };

        let spawner = SessionSpawner::new(SessionContext::new(roster));
        spawner.spawn_all(&mut self.spawns, &mut self.state)?;
        self.session_started = true;
        Ok(())
    }

    /// Drains queued commands and applies them in per-sender order.
    /// Fire requests are resolved synchronously, in detection order.
    async fn process_commands(&mut self) {
        let drained = {
            let mut peers = self.peers.write().await;
            peers.drain_ordered()
        };

        for (peer_id, command) in drained {
            match command {
                Command::Movement {
                    position_delta,
                    rotation_delta,
                } => {
                    self.state
                        .apply_movement_intent(peer_id, position_delta, rotation_delta);
                }
                Command::SetScore { value } => {
                    self.state.set_score(peer_id, value);
                }
                Command::Fire => {
                    if let Some(hit) = combat::scan_hit(&self.state, peer_id) {
                        combat::resolve_hit(&mut self.state, hit);
                    }
                }
            }
        }
    }

    /// Applies pickups entered this tick and destroys the consumed ones.
    fn resolve_pickups(&mut self) {
        let entries = pickup::detect_entries(&self.state, &self.pickups);
        for (player_id, index) in entries {
            pickup::resolve_pickup(&mut self.state, player_id, &mut self.pickups[index]);
        }
        self.pickups.retain(|p| !p.consumed);
    }

    fn broadcast_session_state(&mut self) {
        if self.state.is_empty() {
            return;
        }

        let packet = Packet::SessionState {
            tick: self.state.tick,
            players: self.state.snapshot(),
        };
        self.broadcast_packet(packet);
    }

    /// Main loop: network events interleaved with fixed ticks.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver().await;
        self.spawn_network_sender().await;
        self.spawn_timeout_checker().await;

        let mut tick_interval = interval(self.tick_duration);

        info!(
            "Waiting for {} players to join the lobby",
            self.expected_players
        );

        loop {
            tokio::select! {
                event = self.event_rx.recv() => {
                    match event {
                        Some(ServerEvent::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        }
                        Some(ServerEvent::PeerTimeout { peer_id }) => {
                            self.state.remove_player(&peer_id);
                        }
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    self.process_commands().await;

                    if self.session_started {
                        self.state.step();
                        self.resolve_pickups();
                        self.broadcast_session_state();

                        if self.state.tick % 300 == 0 {
                            debug!(
                                "Tick {}: {} players, {} pickups left",
                                self.state.tick,
                                self.state.len(),
                                self.pickups.len()
                            );
                        }
                    }
                },
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_server_event_packet_received() {
        let packet = Packet::Connect {
            client_version: PROTOCOL_VERSION,
        };
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080);

        let event = ServerEvent::PacketReceived {
            packet: packet.clone(),
            addr,
        };

        match event {
            ServerEvent::PacketReceived { packet: p, addr: a } => {
                assert_eq!(a, addr);
                match p {
                    Packet::Connect { client_version } => {
                        assert_eq!(client_version, PROTOCOL_VERSION);
                    }
                    _ => panic!("Unexpected packet type"),
                }
            }
            _ => panic!("Unexpected event type"),
        }
    }

    #[test]
    fn test_peer_timeout_event() {
        let event = ServerEvent::PeerTimeout { peer_id: 42 };
        match event {
            ServerEvent::PeerTimeout { peer_id } => assert_eq!(peer_id, 42),
            _ => panic!("Unexpected event type"),
        }
    }

    #[test]
    fn test_outgoing_broadcast_holds_packet() {
        let message = Outgoing::Broadcast {
            packet: Packet::SessionState {
                tick: 3,
                players: Vec::new(),
            },
        };

        match message {
            Outgoing::Broadcast { packet } => match packet {
                Packet::SessionState { tick, players } => {
                    assert_eq!(tick, 3);
                    assert!(players.is_empty());
                }
                _ => panic!("Unexpected packet type"),
            },
            _ => panic!("Unexpected message type"),
        }
    }
}
