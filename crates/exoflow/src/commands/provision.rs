use super::{context_store, load_config};
use colored::Colorize;
use exoflow_provider::ProviderManager;
use std::path::Path;
use tracing::info;

pub async fn handle(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let manager = ProviderManager::new(config);

    println!("{}", "Provisioning management server...".blue());
    let output = manager.provision().await?;

    let store = context_store(config_path);
    store.save("exoscale", &output.context).await?;
    info!(path = %store.context_path().display(), "Saved provider context");

    println!("{}", "✓ Management server is ready".green().bold());
    println!("  public ip:  {}", output.public_ip.cyan());
    println!("  private ip: {}", output.private_ip);
    println!("  ssh key:    {}", output.private_key_path.display());
    println!("  ssh user:   {}", output.ssh_user);
    println!("  context:    {}", store.context_path().display());
    Ok(())
}
