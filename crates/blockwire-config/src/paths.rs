//! Platform directories, following OS conventions via `dirs`.

use std::path::PathBuf;

const APP_NAME: &str = "blockwire";

/// Directory holding `config.ron`, if the OS exposes a config location.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join(APP_NAME))
}

/// Directory for log files. Falls back to the config directory.
pub fn default_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir()
        .or_else(dirs::config_dir)
        .map(|base| base.join(APP_NAME).join("logs"))
}
