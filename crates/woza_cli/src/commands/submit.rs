use anyhow::Result;
use clap::Args;
use uuid::Uuid;

use woza_core::models::collection::CollectionDraft;
use woza_core::ImpactEntry;
use woza_service::config::Config;
use woza_service::ServiceError;

use crate::commands::impact::print_result;
use crate::commands::{parse_entry, Identity};
use crate::connect_service;

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Resident the materials were collected from
    #[arg(long)]
    pub customer: Uuid,

    /// Entries as material=kg
    #[arg(required = true, value_parser = parse_entry)]
    pub entries: Vec<ImpactEntry>,

    /// Object keys of photos uploaded beforehand
    #[arg(long = "photo")]
    pub photos: Vec<String>,

    #[arg(long)]
    pub note: Option<String>,

    #[command(flatten)]
    pub identity: Identity,
}

pub async fn execute(config: &Config, args: SubmitArgs) -> Result<()> {
    let session = args.identity.named_session()?;
    let service = connect_service(config).await?;

    let draft = CollectionDraft {
        customer_id: Some(args.customer),
        entries: args.entries,
        photo_refs: args.photos,
        notes: args.note,
    };

    println!("📤 Submitting collection for resident {}...", args.customer);
    match service.submit_collection(&session, draft).await {
        Ok(receipt) => {
            for warning in &receipt.warnings {
                println!("⚠️  {}", warning);
            }
            print_result(&receipt.impact);
            println!("✅ Collection submitted ({})", receipt.status);
            println!("🔑 UUID: {}", receipt.collection_id);
            Ok(())
        }
        Err(ServiceError::Validation(findings)) => {
            println!("❌ Submission blocked: {} problems", findings.len());
            for finding in &findings {
                println!("   {}", finding);
            }
            anyhow::bail!("collection was not saved")
        }
        Err(ServiceError::Incomplete { collection_id, source }) => {
            eprintln!("🛑 Collection {} was saved without its line items: {}", collection_id, source);
            eprintln!("   Reconcile it before approving. Do not resubmit.");
            anyhow::bail!("incomplete collection {}", collection_id)
        }
        Err(e) if e.is_retryable() => {
            eprintln!("⏳ Store unavailable, nothing was saved. Try again.");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
