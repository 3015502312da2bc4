use anyhow::Result;
use clap::Args;
use uuid::Uuid;

use woza_core::models::collection::CollectionStatus;
use woza_service::config::Config;

use crate::commands::Identity;
use crate::{connect_service, format_rand};

#[derive(Debug, Args)]
pub struct ReviewArgs {
    /// Collection to act on
    #[arg(short, long)]
    pub id: Uuid,

    /// Required when rejecting
    #[arg(long)]
    pub reason: Option<String>,

    #[command(flatten)]
    pub identity: Identity,
}

pub async fn execute(config: &Config, target: CollectionStatus, args: ReviewArgs) -> Result<()> {
    let service = connect_service(config).await?;
    let session = args.identity.session();

    let updated = match target {
        CollectionStatus::Approved => service.approve_collection(&session, args.id).await?,
        CollectionStatus::Completed => service.complete_collection(&session, args.id).await?,
        CollectionStatus::Rejected => {
            let reason = args.reason.as_deref().unwrap_or_default();
            service.reject_collection(&session, args.id, reason).await?
        }
        CollectionStatus::Pending => anyhow::bail!("collections cannot be moved back to pending"),
    };

    println!(
        "✅ Collection {} is now {} ({:.2} kg, {})",
        updated.id,
        updated.status,
        updated.total_weight_kg,
        format_rand(updated.total_value)
    );
    if let Some(reason) = &updated.rejection_reason {
        println!("   Reason: {}", reason);
    }
    Ok(())
}
