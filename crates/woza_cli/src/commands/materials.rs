use anyhow::Result;
use clap::{Args, Subcommand};

use woza_core::models::material::Material;
use woza_service::config::Config;

use crate::commands::Identity;
use crate::{connect_service, format_rand};

#[derive(Debug, Args)]
pub struct MaterialsArgs {
    #[command(subcommand)]
    pub action: MaterialAction,

    #[command(flatten)]
    pub identity: Identity,
}

#[derive(Debug, Subcommand)]
pub enum MaterialAction {
    /// Show the catalogue
    List {
        /// Include deactivated materials
        #[arg(long)]
        all: bool,
    },

    /// Add a material to the catalogue
    Add {
        #[arg(long)]
        id: String,

        #[arg(long)]
        name: String,

        /// Rand per kg
        #[arg(long)]
        price: f64,

        /// kg CO2 saved per kg
        #[arg(long, default_value_t = 0.0)]
        co2: f64,

        /// Litres of water saved per kg
        #[arg(long, default_value_t = 0.0)]
        water: f64,

        /// Litres of landfill saved per kg
        #[arg(long, default_value_t = 0.0)]
        landfill: f64,
    },

    /// Stop offering a material; history keeps it
    Deactivate {
        #[arg(long)]
        id: String,
    },
}

pub async fn execute(config: &Config, args: MaterialsArgs) -> Result<()> {
    let service = connect_service(config).await?;
    let session = args.identity.session();

    match args.action {
        MaterialAction::List { all } => {
            let materials = service.list_materials(&session, all).await?;
            println!("📋 {} materials", materials.len());
            for m in materials {
                let marker = if m.active { " " } else { "✗" };
                println!(
                    "{} {:<12} {:<20} {:>10}/kg  co2 {:.2}  water {:.1}  landfill {:.1}",
                    marker,
                    m.id,
                    m.name,
                    format_rand(m.unit_price_per_kg),
                    m.co2_saved_per_kg,
                    m.water_saved_liters_per_kg,
                    m.landfill_saved_liters_per_kg
                );
            }
        }
        MaterialAction::Add { id, name, price, co2, water, landfill } => {
            let material = Material::new(&id, &name, price).with_impact(co2, water, landfill);
            let created = service.create_material(&session, material).await?;
            println!("✅ Added '{}' at {}/kg", created.id, format_rand(created.unit_price_per_kg));
        }
        MaterialAction::Deactivate { id } => {
            service.deactivate_material(&session, &id).await?;
            println!("✅ Deactivated '{}'", id);
        }
    }
    Ok(())
}
