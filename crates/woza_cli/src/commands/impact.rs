use anyhow::Result;
use clap::Args;
use std::sync::Arc;

use woza_core::{default_materials, ImpactEntry, ImpactResult};
use woza_db::MemoryStore;
use woza_service::config::Config;
use woza_service::WozaService;

use crate::commands::parse_entry;
use crate::{connect_service, format_rand};

#[derive(Debug, Args)]
pub struct ImpactArgs {
    /// Entries as material=kg, e.g. aluminium=2.5 pet=1
    #[arg(required = true, value_parser = parse_entry)]
    pub entries: Vec<ImpactEntry>,

    /// Use the built-in catalogue instead of the database
    #[arg(long)]
    pub offline: bool,

    /// Print the raw result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(config: &Config, args: ImpactArgs) -> Result<()> {
    let service = if args.offline {
        WozaService::new(Arc::new(MemoryStore::with_materials(default_materials())), config.impact)
    } else {
        connect_service(config).await?
    };

    let result = service.compute_impact(&args.entries).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

pub fn print_result(result: &ImpactResult) {
    println!("♻️  Collection Impact");
    println!("   Weight:    {:.2} kg", result.total_weight_kg);
    println!("   Value:     {}", format_rand(result.total_value));
    println!("   Fund:      {}", format_rand(result.fund_value));
    println!("   Wallet:    {}", format_rand(result.wallet_value));
    println!("   Points:    {:.0}", result.points_earned);
    println!("   CO2 saved: {:.2} kg", result.co2_saved_kg);
    println!("   Water:     {:.1} L", result.water_saved_liters);
    println!("   Landfill:  {:.1} L", result.landfill_saved_liters);
}
