use super::{context_store, load_config};
use colored::Colorize;
use exoflow_provider::ProviderManager;
use std::path::Path;
use tracing::info;

pub async fn handle(config_path: &Path, ignore_validation: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = context_store(config_path);
    let context = store.load().await?;

    println!(
        "{} {}",
        "Tearing down management server".blue(),
        context.ip.cyan()
    );
    ProviderManager::new(config)
        .teardown(&context, ignore_validation)
        .await?;

    store.clear().await?;
    info!(path = %store.context_path().display(), "Cleared provider context");
    println!("{}", "✓ Management server and its resources were removed".green().bold());
    Ok(())
}
