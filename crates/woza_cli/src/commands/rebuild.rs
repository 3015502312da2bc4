use anyhow::Result;
use clap::Args;

use woza_db::schema::{rebuild_database, reset_database};
use woza_service::config::Config;

#[derive(Debug, Args)]
pub struct RebuildArgs {
    /// DANGER: Drop existing tables before rebuilding?
    #[arg(long)]
    pub reset: bool,
}

pub async fn execute(config: &Config, args: RebuildArgs) -> Result<()> {
    let pool = config.connect_pool().await?;
    println!("🏗️  Rebuilding Database Schema...");

    if args.reset {
        println!("🔥 Reset requested. Dropping public schema...");
        reset_database(&pool).await?;
    }

    rebuild_database(&pool).await?;

    println!("✅ Database Schema Applied Successfully.");
    Ok(())
}
