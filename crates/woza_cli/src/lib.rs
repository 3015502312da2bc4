pub mod commands;

use std::sync::Arc;
use anyhow::Result;

use woza_service::config::Config;
use woza_service::WozaService;

/// Service over the configured Postgres store.
pub async fn connect_service(config: &Config) -> Result<WozaService> {
    let repository = config.connect_repository().await?;
    Ok(WozaService::new(Arc::new(repository), config.impact))
}

/// Formats rand amounts the way receipts show them, e.g. "R 30.00".
pub fn format_rand(amount: f64) -> String {
    format!("R {:.2}", woza_core::impact::round_currency(amount))
}
