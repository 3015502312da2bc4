use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use woza_core::models::collection::{Collection, CollectionStatus, LineItem};
use woza_core::models::material::Material;

use crate::error::Result;

/// Query window over collection records. `from` is inclusive, `to` exclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionFilter {
    pub collector_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub status: Option<CollectionStatus>,

    #[serde(default, with = "time::serde::rfc3339::option")]
    pub from: Option<OffsetDateTime>,

    #[serde(default, with = "time::serde::rfc3339::option")]
    pub to: Option<OffsetDateTime>,

    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl CollectionFilter {
    pub fn for_collector(collector_id: Uuid) -> Self {
        Self {
            collector_id: Some(collector_id),
            ..Self::default()
        }
    }

    pub fn for_customer(customer_id: Uuid) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }

    /// Filtering part only; pagination is applied by the caller.
    pub fn matches(&self, c: &Collection) -> bool {
        self.collector_id.map_or(true, |id| c.collector_id == id)
            && self.customer_id.map_or(true, |id| c.customer_id == id)
            && self.status.map_or(true, |s| c.status == s)
            && self.from.map_or(true, |t| c.created_at >= t)
            && self.to.map_or(true, |t| c.created_at < t)
    }

    /// Same filter with pagination removed, for aggregate reads.
    pub fn unpaged(&self) -> Self {
        Self {
            limit: None,
            offset: None,
            ..self.clone()
        }
    }
}

/// Everything the service layer needs from persistence.
///
/// Writes are single-shot: `insert_collection` and `insert_line_items` are
/// separate calls and are not atomic with each other.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    // ===== Materials =====

    async fn list_materials(&self, include_inactive: bool) -> Result<Vec<Material>>;

    async fn get_material(&self, id: &str) -> Result<Option<Material>>;

    /// Inserts or replaces the catalogue entry with the same id.
    async fn upsert_material(&self, material: &Material) -> Result<()>;

    async fn set_material_active(&self, id: &str, active: bool) -> Result<()>;

    // ===== Collections =====

    /// Writes the parent record only; `collection.line_items` is ignored.
    async fn insert_collection(&self, collection: &Collection) -> Result<()>;

    async fn insert_line_items(&self, collection_id: Uuid, items: &[LineItem]) -> Result<()>;

    /// Returns the record with its line items attached.
    async fn get_collection(&self, id: Uuid) -> Result<Option<Collection>>;

    /// Newest first, line items attached.
    async fn list_collections(&self, filter: &CollectionFilter) -> Result<Vec<Collection>>;

    /// Moves `id` from `from` to `to`. Fails with `Conflict` when the stored
    /// status is no longer `from`, and `NotFound` when there is no such record.
    async fn update_status(
        &self,
        id: Uuid,
        from: CollectionStatus,
        to: CollectionStatus,
        rejection_reason: Option<&str>,
        at: OffsetDateTime,
    ) -> Result<()>;
}
