use super::load_config;
use colored::Colorize;
use exoflow_provider::{ProviderManager, ValidationErrors};
use std::path::Path;

pub fn handle(config_path: &Path) -> anyhow::Result<()> {
    println!("{}", "Validating configuration...".blue());

    let config = load_config(config_path)?;
    let manager = ProviderManager::new(config);

    let errors = manager.validate(ValidationErrors::new());
    if errors.is_empty() {
        println!("{}", "✓ Configuration is valid".green().bold());
        return Ok(());
    }

    for (key, message) in &errors {
        println!("  {} {}: {}", "✗".red(), key.cyan(), message);
    }
    anyhow::bail!("{} validation error(s)", errors.len())
}
