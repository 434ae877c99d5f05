use clap::Parser;
use log::info;
use server::network::Server;
use server::pickup::Pickup;
use shared::Vec3;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Tick rate (simulation steps per second)
    #[arg(short, long, default_value = "30")]
    tick_rate: u32,

    /// Number of players the session waits for before spawning
    #[arg(long, default_value = "2")]
    players: usize,

    /// Number of spawn points placed on the arena ring
    #[arg(long, default_value = "4")]
    spawn_count: usize,

    /// Radius of the arena spawn ring
    #[arg(long, default_value = "10.0")]
    spawn_radius: f32,
}

/// Evenly spaced spawn ring standing in for the level's spawn geometry.
fn ring_spawn_points(count: usize, radius: f32) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let angle = (i as f32) * 360.0 / (count as f32);
            Vec3::new(0.0, 0.0, radius).rotated_y(angle)
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_secs_f32(1.0 / args.tick_rate as f32);

    let spawn_points = ring_spawn_points(args.spawn_count, args.spawn_radius);
    let pickups = vec![
        Pickup::damage_boost(Vec3::new(args.spawn_radius / 2.0, 1.5, 0.0)),
        Pickup::damage_boost(Vec3::new(-args.spawn_radius / 2.0, 1.5, 0.0)),
    ];

    info!(
        "Starting authority on {} ({} Hz, {} players)",
        address, args.tick_rate, args.players
    );

    let mut server = Server::new(
        &address,
        tick_duration,
        args.players,
        spawn_points,
        pickups,
    )
    .await?;

    server.run().await?;

    Ok(())
}
