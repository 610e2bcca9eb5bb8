//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::info;

/// Write a default configuration file
///
/// `config_file` is written as given; without it the default location
/// (`~/.crestmirror/config.toml`) is used. Returns the path of the written
/// file.
pub fn cmd_init(config_file: Option<PathBuf>, force: bool) -> Result<PathBuf> {
    let mut config = Config::default();

    let config_file = config_file.unwrap_or_else(Config::default_config_path);
    config.paths.base_dir = config_file
        .parent()
        .map(PathBuf::from)
        .unwrap_or_default();
    config.paths.config_file = config_file;

    if config.paths.config_file.exists() && !force {
        return Err(Error::AlreadyInitialized(
            config.paths.config_file.display().to_string(),
        ));
    }

    config.validate()?;
    config.save()?;
    info!("Created config at {:?}", config.paths.config_file);

    Ok(config.paths.config_file)
}
