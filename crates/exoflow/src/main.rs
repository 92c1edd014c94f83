mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "exoflow")]
#[command(about = "Provision an Exoscale management server", long_about = None)]
struct Cli {
    /// Verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the configuration template
    Init {
        /// Directory to write exoflow-config.yaml into
        #[arg(short, long, default_value = ".")]
        target_dir: PathBuf,
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        reset: bool,
    },
    /// Create the management server and its resources
    Provision {
        /// Configuration file
        #[arg(short, long, env = "EXOFLOW_CONFIG", default_value = exoflow_config::CONFIG_FILE_NAME)]
        config: PathBuf,
    },
    /// Validate the configuration
    Validate {
        /// Configuration file
        #[arg(short, long, env = "EXOFLOW_CONFIG", default_value = exoflow_config::CONFIG_FILE_NAME)]
        config: PathBuf,
    },
    /// Destroy the management server and its resources
    Teardown {
        /// Configuration file
        #[arg(short, long, env = "EXOFLOW_CONFIG", default_value = exoflow_config::CONFIG_FILE_NAME)]
        config: PathBuf,
        /// Skip teardown validation
        #[arg(long)]
        ignore_validation: bool,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Init { target_dir, reset } => commands::init::handle(&target_dir, reset),
        Commands::Provision { config } => commands::provision::handle(&config).await,
        Commands::Validate { config } => commands::validate::handle(&config),
        Commands::Teardown {
            config,
            ignore_validation,
        } => commands::teardown::handle(&config, ignore_validation).await,
        Commands::Version => {
            println!("exoflow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
