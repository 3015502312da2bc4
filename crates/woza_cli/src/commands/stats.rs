use anyhow::Result;
use clap::Args;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use woza_core::models::session::Role;
use woza_db::CollectionFilter;
use woza_service::config::Config;

use crate::commands::Identity;
use crate::{connect_service, format_rand};

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// First day to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_day)]
    pub from: Option<OffsetDateTime>,

    /// First day to exclude (YYYY-MM-DD)
    #[arg(long, value_parser = parse_day)]
    pub to: Option<OffsetDateTime>,

    /// Only this collector's collections
    #[arg(long)]
    pub collector: Option<Uuid>,

    /// Leaderboard size
    #[arg(long, default_value_t = 5)]
    pub top: usize,

    #[command(flatten)]
    pub identity: Identity,
}

pub fn parse_day(raw: &str) -> Result<OffsetDateTime, String> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(raw.trim(), format)
        .map(|d| d.midnight().assume_utc())
        .map_err(|e| format!("'{}' is not a YYYY-MM-DD date: {}", raw, e))
}

pub async fn execute(config: &Config, args: StatsArgs) -> Result<()> {
    let service = connect_service(config).await?;
    let session = args.identity.session();

    let filter = CollectionFilter {
        collector_id: args.collector,
        from: args.from,
        to: args.to,
        ..CollectionFilter::default()
    };

    let overview = service.dashboard_overview(&session, &filter).await?;
    let stats = &overview.stats;

    println!("📊 Collections: {}", stats.collection_count);
    println!(
        "   pending {} | approved {} | rejected {} | completed {}",
        stats.pending, stats.approved, stats.rejected, stats.completed
    );
    println!("   Weight:  {:.2} kg (avg {:.2} kg)", stats.total_weight_kg, stats.average_weight_kg);
    println!("   Value:   {} (avg {})", format_rand(stats.total_value), format_rand(stats.average_value));
    println!("   Fund:    {}", format_rand(stats.impact.fund_value));
    println!("   CO2:     {:.2} kg saved", stats.impact.co2_saved_kg);

    if !overview.trend.is_empty() {
        println!("📈 Monthly");
        for point in &overview.trend {
            println!(
                "   {}  {:>4} collections  {:>10.2} kg  {:>12}",
                point.period,
                point.collection_count,
                point.total_weight_kg,
                format_rand(point.total_value)
            );
        }
    }

    if !overview.materials.is_empty() {
        println!("🧺 By material");
        for share in &overview.materials {
            println!("   {:<12} {:>10.2} kg  {:>12}", share.material_id, share.weight_kg, format_rand(share.value));
        }
    }

    if session.role == Role::Admin {
        let board = service.collector_leaderboard(&session, &filter, args.top).await?;
        if !board.is_empty() {
            println!("🏆 Top collectors");
            for (rank, entry) in board.iter().enumerate() {
                println!(
                    "   {}. {}  {:.2} kg  {}",
                    rank + 1,
                    entry.collector_id,
                    entry.total_weight_kg,
                    format_rand(entry.total_value)
                );
            }
        }
    }
    Ok(())
}
