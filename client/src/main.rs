mod game;
mod input;
mod network;
mod rendering;

use clap::Parser;
use log::{info, warn};
use macroquad::prelude::*;
use tokio::runtime::Runtime;

use game::ReplicaStore;
use input::InputManager;
use network::{NetEvent, NetworkClient};
use rendering::Renderer;
use shared::{Command, MovementIntent, STARTING_SCORE};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Arena Client".to_owned(),
        window_width: 800,
        window_height: 600,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    info!("Connecting to {}", args.server);

    // macroquad owns the main loop, so networking runs on its own runtime.
    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            return;
        }
    };

    let mut client = match NetworkClient::connect(&runtime, &args.server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            return;
        }
    };

    let mut replica = ReplicaStore::new();
    let mut input = InputManager::new();
    let renderer = Renderer::new();

    let mut client_id: Option<u32> = None;
    let mut held_intent: Option<MovementIntent> = None;

    loop {
        // Drain everything the server sent since last frame.
        while let Some(event) = client.poll_event() {
            match event {
                NetEvent::Connected { client_id: id } => {
                    info!("Connected as client {}", id);
                    client_id = Some(id);
                }
                NetEvent::SessionState { tick, players } => {
                    let newcomers = replica.apply_session_state(tick, players);
                    // One local step per authority tick: the snapshot
                    // carries per-tick deltas, so integrating on any
                    // other cadence would scale remote movement speed.
                    replica.step(client_id);
                    // The owned player advances on the same cadence,
                    // from the most recently sampled intent.
                    if let (Some(id), Some(intent)) = (client_id, &held_intent) {
                        replica.apply_local_intent(id, intent);
                        client.send_command(Command::Movement {
                            position_delta: intent.position_delta,
                            rotation_delta: intent.rotation_delta,
                        });
                    }
                    for id in newcomers {
                        replica.on_score_change(
                            id,
                            Box::new(move |previous, current| {
                                info!("Player {} score {} -> {}", id, previous, current);
                            }),
                        );
                        replica.on_color_change(
                            id,
                            Box::new(move |previous, current| {
                                info!("Player {} color {:?} -> {:?}", id, previous, current);
                            }),
                        );
                    }
                }
                NetEvent::Disconnected { reason } => {
                    warn!("Disconnected by server: {}", reason);
                    client_id = None;
                }
            }
        }

        let alive = client_id.map(|id| replica.is_alive(id)).unwrap_or(false);
        let frame = input.sample(alive);
        held_intent = frame.intent;

        if client_id.is_some() {
            if frame.fire {
                client.send_command(Command::Fire);
            }
            if frame.reset_score {
                client.send_command(Command::SetScore {
                    value: STARTING_SCORE,
                });
            }
        }

        renderer.render(&replica.render_players(), client_id, client_id.is_some());

        if is_key_pressed(KeyCode::Escape) {
            client.disconnect();
            break;
        }

        next_frame().await;
    }

    info!("Client shut down");
}
