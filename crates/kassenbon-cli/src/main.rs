mod stats;
mod sync;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "kassenbon")]
#[command(about = "Collects Lidl portal receipts into a local spending dataset")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch receipts that are not yet in the dataset
    Sync {
        /// Show what would be fetched without touching the dataset
        #[arg(long)]
        dry_run: bool,
    },
    /// Re-fetch and re-parse every receipt in the portal listing
    Update {
        /// Show what would be fetched without touching the dataset
        #[arg(long)]
        dry_run: bool,
    },
    /// Re-sort the dataset newest first
    Sort,
    /// Print a spending summary for the dataset
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = kassenbon_core::load_config_from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sync { dry_run } => sync::run_sync(&config, false, dry_run).await,
        Commands::Update { dry_run } => sync::run_sync(&config, true, dry_run).await,
        Commands::Sort => sync::run_sort(&config),
        Commands::Stats => stats::run_stats(&config),
    }
}
