use colored::Colorize;
use std::path::Path;

pub fn handle(target_dir: &Path, reset: bool) -> anyhow::Result<()> {
    let target = target_dir.join(exoflow_config::CONFIG_FILE_NAME);

    if exoflow_config::init(target_dir, reset)? {
        println!(
            "{} {}",
            "✓ Wrote".green().bold(),
            target.display().to_string().cyan()
        );
        println!("  Fill in authentication.api_key, api_secret_key and the instance image.");
    } else {
        println!(
            "{} {} already exists; use --reset to overwrite it",
            "!".yellow().bold(),
            target.display()
        );
    }
    Ok(())
}
