use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use woza_api::{app_router, AppState};
use woza_service::config::Config;
use woza_service::{PhotoVault, WozaService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Configuration and storage, decided once at startup
    let config = Config::from_env()?;
    let repository = config.connect_repository().await?;
    let photos = PhotoVault::from_config(&config).await;

    let service = WozaService::new(Arc::new(repository), config.impact).with_photos(photos);

    // 2. Approval consumer: for now every status change is logged
    let mut events = service.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(
                    collection_id = %event.collection_id,
                    from = ?event.from,
                    to = %event.to,
                    "status changed"
                ),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "status listener lagged")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // 3. Serve
    let app = app_router(AppState::new(service));
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
