//! Configuration for the relay and its clients.
//!
//! Settings persist to disk as RON, accept CLI overrides via clap, and
//! tolerate missing or unknown fields so older files keep loading.

mod cli;
mod config;
mod error;
mod paths;

pub use cli::CliArgs;
pub use config::{ClientConfig, Config, DebugConfig, RelayConfig};
pub use error::ConfigError;
pub use paths::{default_config_dir, default_log_dir};
