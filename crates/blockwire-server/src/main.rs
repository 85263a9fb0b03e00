//! Relay binary.

use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;
use std::sync::Arc;

use blockwire_config::{CliArgs, Config};
use blockwire_net::FrameConfig;
use blockwire_server::{RelayServer, ServerConfig};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let log_dir = blockwire_config::default_log_dir();
    blockwire_log::init_logging(log_dir.as_deref(), cfg!(debug_assertions), Some(&config));

    let bind_ip: IpAddr = match config.relay.bind_address.parse() {
        Ok(ip) => ip,
        Err(e) => {
            tracing::error!("Invalid bind address {:?}: {e}", config.relay.bind_address);
            return ExitCode::FAILURE;
        }
    };

    let server = Arc::new(RelayServer::new(ServerConfig {
        bind_addr: SocketAddr::new(bind_ip, config.relay.port),
        frame: FrameConfig {
            max_payload_size: config.relay.max_frame_bytes,
        },
    }));

    let signal_server = Arc::clone(&server);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_server.shutdown();
        }
    });

    match server.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Relay stopped: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &CliArgs) -> Result<Config, blockwire_config::ConfigError> {
    let dir = args.config.clone().or_else(blockwire_config::default_config_dir);
    let mut config = match dir {
        Some(dir) => Config::load_or_create(&dir)?,
        None => Config::default(),
    };
    config.apply_cli_overrides(args);
    Ok(config)
}
