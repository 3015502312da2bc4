use anyhow::Result;
use clap::Args;
use tokio::net::TcpListener;

use woza_api::{app_router, AppState};
use woza_service::config::Config;
use woza_service::PhotoVault;

use crate::connect_service;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Overrides WOZA_BIND_ADDR
    #[arg(long)]
    pub bind: Option<String>,
}

pub async fn execute(config: &Config, args: ServeArgs) -> Result<()> {
    let photos = PhotoVault::from_config(config).await;
    let service = connect_service(config).await?.with_photos(photos);

    let addr = args.bind.unwrap_or_else(|| config.bind_addr.clone());
    let listener = TcpListener::bind(&addr).await?;
    println!("🚀 Serving on {}", listener.local_addr()?);

    axum::serve(listener, app_router(AppState::new(service))).await?;
    Ok(())
}
