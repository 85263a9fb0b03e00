//! Command-line arguments for the relay binary.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Relay command-line arguments. Values override `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "blockwire-server", about = "Multiplayer relay for shared voxel worlds")]
pub struct CliArgs {
    /// IP address to listen on.
    #[arg(long)]
    pub bind: Option<String>,

    /// Port to listen on.
    #[arg(long)]
    pub port: Option<u16>,

    /// Log level (error, warn, info, debug, trace) or a full filter string.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref bind) = args.bind {
            self.relay.bind_address = bind.clone();
        }
        if let Some(port) = args.port {
            self.relay.port = port;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
