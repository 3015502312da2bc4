use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use woza_core::models::collection::{Collection, CollectionStatus};

/// Published whenever a collection enters or changes status.
/// `from` is `None` for a freshly submitted collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChanged {
    pub collection_id: Uuid,
    pub collector_id: Uuid,
    pub customer_id: Uuid,
    pub from: Option<CollectionStatus>,
    pub to: CollectionStatus,

    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

impl StatusChanged {
    pub fn submitted(collection: &Collection) -> Self {
        Self {
            collection_id: collection.id,
            collector_id: collection.collector_id,
            customer_id: collection.customer_id,
            from: None,
            to: collection.status,
            at: collection.created_at,
        }
    }

    pub fn moved(collection: &Collection, from: CollectionStatus, at: OffsetDateTime) -> Self {
        Self {
            collection_id: collection.id,
            collector_id: collection.collector_id,
            customer_id: collection.customer_id,
            from: Some(from),
            to: collection.status,
            at,
        }
    }
}
