pub mod init;
pub mod provision;
pub mod teardown;
pub mod validate;

use anyhow::Context;
use exoflow_cloud::ContextStore;
use exoflow_config::ProviderConfig;
use std::path::Path;

/// Load the user config merged over the defaults
pub fn load_config(config_path: &Path) -> anyhow::Result<ProviderConfig> {
    exoflow_config::load_config(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))
}

/// The provider context lives next to the configuration file
pub fn context_store(config_path: &Path) -> ContextStore {
    let root = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ContextStore::new(root)
}
