pub mod error;
pub mod merge;
pub mod model;
pub mod paths;

pub use error::*;
pub use merge::deep_merge;
pub use model::*;
pub use paths::expand_home;

use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "exoflow-config.yaml";
pub const DEFAULTS_CONFIG_FILE_NAME: &str = "exoflow-config.defaults.yaml";

/// Template written by [`init`]
pub const CONFIG_TEMPLATE: &str = include_str!("../templates/exoflow-config.yaml");

/// Defaults used when no defaults file sits next to the user config
pub const DEFAULT_CONFIG: &str = include_str!("../templates/exoflow-config.defaults.yaml");

/// Write the configuration template into `target_dir`.
///
/// Returns `false` without touching anything when a config file already
/// exists there and `reset_config` is not set.
pub fn init(target_dir: &Path, reset_config: bool) -> Result<bool> {
    let target = target_dir.join(CONFIG_FILE_NAME);
    if !reset_config && target.exists() {
        debug!(
            "config file path {} already exists. either set a different config target directory or enable reset_config",
            target.display()
        );
        return Ok(false);
    }

    std::fs::create_dir_all(target_dir)?;
    debug!("Writing provider config template to {}", target.display());
    std::fs::write(&target, CONFIG_TEMPLATE)?;
    Ok(true)
}

/// Load the user config at `config_path` merged over the defaults
pub fn load_config(config_path: &Path) -> Result<ProviderConfig> {
    if !config_path.exists() {
        return Err(ConfigError::ConfigFileNotFound(config_path.to_path_buf()));
    }

    debug!("safe loading user config {}", config_path.display());
    let user_config = read_yaml(config_path)?;

    let defaults_path = defaults_path_for(config_path);
    let defaults_config = if defaults_path.exists() {
        debug!("safe loading default config {}", defaults_path.display());
        read_yaml(&defaults_path)?
    } else {
        debug!("using built-in default config");
        serde_yaml::from_str(DEFAULT_CONFIG)?
    };

    debug!("merging configurations");
    let merged = deep_merge(&user_config, &defaults_config)?;
    Ok(serde_yaml::from_value(merged)?)
}

/// Parse a config document merged over the built-in defaults
pub fn parse_config(content: &str) -> Result<ProviderConfig> {
    let user_config: Value = serde_yaml::from_str(content)?;
    let defaults_config: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
    let merged = deep_merge(&user_config, &defaults_config)?;
    Ok(serde_yaml::from_value(merged)?)
}

fn defaults_path_for(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(DEFAULTS_CONFIG_FILE_NAME)
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}
