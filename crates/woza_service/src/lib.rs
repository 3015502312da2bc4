pub mod config;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod materials;
pub mod photos;
pub mod review;
pub mod submission;

use std::sync::Arc;
use tokio::sync::broadcast;

use woza_core::{ImpactCalculator, ImpactParams, RateTable};
use woza_db::CollectionStore;

pub use error::{Result, ServiceError};
pub use events::StatusChanged;
pub use photos::PhotoVault;

const EVENT_BUFFER: usize = 256;

#[derive(Clone)]
pub struct WozaService {
    pub store: Arc<dyn CollectionStore>,
    pub params: ImpactParams,
    pub photos: Option<PhotoVault>,
    events: broadcast::Sender<StatusChanged>,
}

impl WozaService {
    pub fn new(store: Arc<dyn CollectionStore>, params: ImpactParams) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            store,
            params,
            photos: None,
            events,
        }
    }

    pub fn with_photos(mut self, vault: PhotoVault) -> Self {
        self.photos = Some(vault);
        self
    }

    /// Approval consumers listen here. Lagging receivers drop old events.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusChanged> {
        self.events.subscribe()
    }

    /// Snapshot of the active catalogue as a rate table.
    pub async fn rate_table(&self) -> Result<RateTable> {
        let materials = self.store.list_materials(false).await?;
        Ok(RateTable::from_materials(&materials))
    }

    pub fn calculator<'a>(&self, rates: &'a RateTable) -> ImpactCalculator<'a> {
        ImpactCalculator::new(rates, self.params)
    }

    fn publish(&self, event: StatusChanged) {
        if self.events.send(event).is_err() {
            tracing::debug!("no status subscribers");
        }
    }
}
