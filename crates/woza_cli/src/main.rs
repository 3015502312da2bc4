use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use woza_cli::commands;
use woza_core::models::collection::CollectionStatus;
use woza_service::config::Config;

#[derive(Parser)]
#[command(name = "woza")]
#[command(about = "Woza Mali recycling collections toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the database schema from embedded assets
    Rebuild(commands::rebuild::RebuildArgs),

    /// Manage the material catalogue
    Materials(commands::materials::MaterialsArgs),

    /// Value a set of entries without saving anything
    Impact(commands::impact::ImpactArgs),

    /// Submit a collection on behalf of a collector
    Submit(commands::submit::SubmitArgs),

    /// Approve a pending collection
    Approve(commands::review::ReviewArgs),

    /// Reject a pending collection (needs --reason)
    Reject(commands::review::ReviewArgs),

    /// Mark an approved collection as paid out
    Complete(commands::review::ReviewArgs),

    /// Dashboard figures for a period
    Stats(commands::stats::StatsArgs),

    /// Run the HTTP API
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    // 1. Parse arguments, then load config (fails fast if invalid)
    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing::debug!(schema = ?config.schema, bind = %config.bind_addr, "configuration loaded");

    // 2. Route to the command
    match cli.command {
        Commands::Rebuild(args) => commands::rebuild::execute(&config, args).await?,
        Commands::Materials(args) => commands::materials::execute(&config, args).await?,
        Commands::Impact(args) => commands::impact::execute(&config, args).await?,
        Commands::Submit(args) => commands::submit::execute(&config, args).await?,
        Commands::Approve(args) => {
            commands::review::execute(&config, CollectionStatus::Approved, args).await?
        }
        Commands::Reject(args) => {
            commands::review::execute(&config, CollectionStatus::Rejected, args).await?
        }
        Commands::Complete(args) => {
            commands::review::execute(&config, CollectionStatus::Completed, args).await?
        }
        Commands::Stats(args) => commands::stats::execute(&config, args).await?,
        Commands::Serve(args) => commands::serve::execute(&config, args).await?,
    }

    Ok(())
}
