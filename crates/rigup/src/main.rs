mod commands;
mod prompt;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rigup")]
#[command(about = "Deploy ShowKit and its bundles to a DigitalOcean droplet", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the given deployment definition
    Deploy {
        /// Path to the deployment definition (.yml, .yaml, or .json)
        file: PathBuf,
        /// Resolve everything and print the cloud-config, but create nothing
        #[arg(long)]
        dry_run: bool,
        /// Also dump the rendered cloud-config to a timestamped file
        #[arg(long)]
        debug: bool,
    },
    /// Check a deployment definition without touching any provider
    Validate {
        /// Path to the deployment definition (.yml, .yaml, or .json)
        file: PathBuf,
    },
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Deploy {
            file,
            dry_run,
            debug,
        } => commands::deploy::handle(file, dry_run, debug).await,
        Commands::Validate { file } => commands::validate::handle(file),
        Commands::Version => {
            println!("rigup {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(error) = result {
        // An operator abort is a clean, already-communicated outcome.
        if matches!(
            error.downcast_ref::<rigup_deploy::DeployError>(),
            Some(rigup_deploy::DeployError::Aborted)
        ) {
            println!("{}", "Deployment aborted.".yellow());
            std::process::exit(1);
        }

        eprintln!("{} {error:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
