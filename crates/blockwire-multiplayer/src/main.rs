//! Headless relay client. Prints chat, notices and world edits; each stdin
//! line is sent as chat, `/quit` leaves.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use blockwire_config::Config;
use blockwire_multiplayer::{ClientEvents, LocalPlayer, NetworkManager};
use blockwire_net::{BlockChange, ConnectionState, PlayerId, Skin};
use clap::Parser;
use glam::DVec3;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Frame pacing for polling and interpolation.
const FRAME: Duration = Duration::from_millis(16);

#[derive(Parser, Debug)]
#[command(name = "blockwire-client", about = "Headless chat client for a blockwire relay")]
struct ClientArgs {
    /// Relay address as `host[:port]`.
    #[arg(long)]
    server: Option<String>,

    /// Display name sent on join.
    #[arg(long)]
    name: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    config: Option<PathBuf>,
}

struct Console;

impl ClientEvents for Console {
    fn on_block_update(&mut self, change: BlockChange) {
        let p = change.position;
        if change.block_type.is_air() {
            println!("* block removed at {} {} {}", p.x, p.y, p.z);
        } else {
            println!(
                "* block {} placed at {} {} {}",
                change.block_type.0, p.x, p.y, p.z
            );
        }
    }

    fn on_world_replay(&mut self, changes: &[BlockChange]) {
        println!("* world has {} edits", changes.len());
    }

    fn on_chat(&mut self, _player_id: PlayerId, player_name: &str, message: &str) {
        println!("<{player_name}> {message}");
    }

    fn on_system_message(&mut self, text: &str) {
        println!("* {text}");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = ClientArgs::parse();

    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(server) = args.server {
        config.client.server_address = server;
    }
    if let Some(name) = args.name {
        config.client.player_name = name;
    }

    let log_dir = blockwire_config::default_log_dir();
    blockwire_log::init_logging(log_dir.as_deref(), cfg!(debug_assertions), Some(&config));

    let mut client = match NetworkManager::connect_with_config(&config.client, Skin::default()).await
    {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut state_rx = client.state().subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut frame = tokio::time::interval(FRAME);
    let mut console = Console;
    // Stands still at spawn so peers see a player model.
    let local = LocalPlayer {
        position: DVec3::new(0.0, 70.0, 0.0),
        on_ground: true,
        ..LocalPlayer::default()
    };

    loop {
        tokio::select! {
            _ = frame.tick() => {
                client.poll(&mut console);
                client.update(Instant::now(), &local);
                client.interpolate();
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) if line.trim() == "/quit" => break,
                Ok(Some(line)) => {
                    let text = line.trim();
                    if !text.is_empty() {
                        client.send_chat(text);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Reading stdin failed: {e}");
                    break;
                }
            },
            changed = state_rx.changed() => {
                if changed.is_err() || *state_rx.borrow() == ConnectionState::Disconnected {
                    // Let the reader close the channel so the notice is printed.
                    tokio::time::sleep(FRAME).await;
                    client.poll(&mut console);
                    return ExitCode::FAILURE;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.disconnect();
    ExitCode::SUCCESS
}

fn load_config(args: &ClientArgs) -> Result<Config, blockwire_config::ConfigError> {
    let dir = args.config.clone().or_else(blockwire_config::default_config_dir);
    match dir {
        Some(dir) => Config::load_or_create(&dir),
        None => Ok(Config::default()),
    }
}
