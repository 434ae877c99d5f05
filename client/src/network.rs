//! Client transport: a tokio I/O task bridged to the frame loop
//!
//! The render loop belongs to macroquad, so all socket work runs on a
//! tokio runtime and talks to the frame loop over unbounded channels.
//! Sending is fire-and-forget; nothing here blocks the loop.

use bincode::{deserialize, serialize};
use log::{error, info, warn};
use shared::{Command, Packet, PlayerState, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

/// Network happenings surfaced to the frame loop.
#[derive(Debug)]
pub enum NetEvent {
    Connected { client_id: u32 },
    SessionState { tick: u32, players: Vec<PlayerState> },
    Disconnected { reason: String },
}

/// Handle the frame loop uses to talk to the authority.
pub struct NetworkClient {
    outgoing: mpsc::UnboundedSender<Packet>,
    events: mpsc::UnboundedReceiver<NetEvent>,
    next_sequence: u32,
}

impl NetworkClient {
    /// Spawns the I/O task on the given runtime and sends the connect
    /// handshake.
    pub fn connect(runtime: &Runtime, server_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let server_addr: SocketAddr = server_addr.parse()?;

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        runtime.spawn(io_task(server_addr, out_rx, event_tx));

        info!("Connecting to {}", server_addr);
        out_tx.send(Packet::Connect {
            client_version: PROTOCOL_VERSION,
        })?;

        Ok(Self {
            outgoing: out_tx,
            events: event_rx,
            next_sequence: 1,
        })
    }

    /// Next pending network event, if any. Never blocks.
    pub fn poll_event(&mut self) -> Option<NetEvent> {
        self.events.try_recv().ok()
    }

    /// Queues a command for the authority, stamped with the next
    /// sequence number so the authority can restore send order.
    pub fn send_command(&mut self, command: Command) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        if self
            .outgoing
            .send(Packet::Command { sequence, command })
            .is_err()
        {
            error!("Network task gone, dropping command");
        }
    }

    pub fn disconnect(&self) {
        let _ = self.outgoing.send(Packet::Disconnect);
    }
}

/// Socket loop: ships queued packets out and decodes whatever comes back.
async fn io_task(
    server_addr: SocketAddr,
    mut out_rx: mpsc::UnboundedReceiver<Packet>,
    event_tx: mpsc::UnboundedSender<NetEvent>,
) {
    let socket = match UdpSocket::bind("0.0.0.0:0").await {
        Ok(socket) => socket,
        Err(e) => {
            error!("Failed to bind client socket: {}", e);
            return;
        }
    };
    if let Err(e) = socket.connect(server_addr).await {
        error!("Failed to set peer address: {}", e);
        return;
    }

    let mut buffer = [0u8; 8192];

    loop {
        tokio::select! {
            result = socket.recv(&mut buffer) => {
                match result {
                    Ok(len) => {
                        let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) else {
                            warn!("Failed to deserialize packet from server");
                            continue;
                        };

                        let event = match packet {
                            Packet::Connected { client_id } => {
                                info!("Connected! Client ID: {}", client_id);
                                NetEvent::Connected { client_id }
                            }
                            Packet::SessionState { tick, players } => {
                                NetEvent::SessionState { tick, players }
                            }
                            Packet::Disconnected { reason } => {
                                warn!("Disconnected: {}", reason);
                                NetEvent::Disconnected { reason }
                            }
                            _ => {
                                warn!("Unexpected packet type from server");
                                continue;
                            }
                        };

                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            },

            message = out_rx.recv() => {
                match message {
                    Some(packet) => {
                        match serialize(&packet) {
                            Ok(data) => {
                                if let Err(e) = socket.send(&data).await {
                                    error!("Error sending packet: {}", e);
                                }
                            }
                            Err(e) => error!("Failed to serialize packet: {}", e),
                        }
                    }
                    // Frame loop dropped its handle; we're done.
                    None => break,
                }
            },
        }
    }
}
