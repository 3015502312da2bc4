use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use woza_core::models::collection::{Collection, CollectionStatus, LineItem};
use woza_core::models::material::Material;

use crate::error::{Result, StoreError};
use crate::store::{CollectionFilter, CollectionStore};

/// In-process store for tests, demos and offline CLI use.
///
/// The `fail_*` switches make the next matching write fail with a retryable
/// error, which is how partial-persistence paths get exercised.
#[derive(Default)]
pub struct MemoryStore {
    materials: Mutex<BTreeMap<String, Material>>,
    collections: Mutex<HashMap<Uuid, Collection>>,
    pub fail_collection_writes: AtomicBool,
    pub fail_line_item_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_materials(materials: impl IntoIterator<Item = Material>) -> Self {
        let map = materials.into_iter().map(|m| (m.id.clone(), m)).collect();
        Self {
            materials: Mutex::new(map),
            ..Self::default()
        }
    }

    fn injected(flag: &AtomicBool, what: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("injected failure writing {}", what)));
        }
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn list_materials(&self, include_inactive: bool) -> Result<Vec<Material>> {
        let materials = self.materials.lock().await;
        Ok(materials
            .values()
            .filter(|m| include_inactive || m.active)
            .cloned()
            .collect())
    }

    async fn get_material(&self, id: &str) -> Result<Option<Material>> {
        Ok(self.materials.lock().await.get(id).cloned())
    }

    async fn upsert_material(&self, material: &Material) -> Result<()> {
        self.materials
            .lock()
            .await
            .insert(material.id.clone(), material.clone());
        Ok(())
    }

    async fn set_material_active(&self, id: &str, active: bool) -> Result<()> {
        let mut materials = self.materials.lock().await;
        let material = materials
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("material '{}'", id)))?;
        material.active = active;
        Ok(())
    }

    async fn insert_collection(&self, collection: &Collection) -> Result<()> {
        Self::injected(&self.fail_collection_writes, "collection")?;

        let mut collections = self.collections.lock().await;
        if collections.contains_key(&collection.id) {
            return Err(StoreError::Conflict(format!("collection {} already exists", collection.id)));
        }
        let mut stored = collection.clone();
        stored.line_items.clear();
        collections.insert(stored.id, stored);
        Ok(())
    }

    async fn insert_line_items(&self, collection_id: Uuid, items: &[LineItem]) -> Result<()> {
        Self::injected(&self.fail_line_item_writes, "line items")?;

        let mut collections = self.collections.lock().await;
        let collection = collections
            .get_mut(&collection_id)
            .ok_or_else(|| StoreError::NotFound(format!("collection {}", collection_id)))?;
        collection.line_items.extend_from_slice(items);
        Ok(())
    }

    async fn get_collection(&self, id: Uuid) -> Result<Option<Collection>> {
        Ok(self.collections.lock().await.get(&id).cloned())
    }

    async fn list_collections(&self, filter: &CollectionFilter) -> Result<Vec<Collection>> {
        let collections = self.collections.lock().await;
        let mut matched: Vec<Collection> = collections
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        drop(collections);

        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: CollectionStatus,
        to: CollectionStatus,
        rejection_reason: Option<&str>,
        at: OffsetDateTime,
    ) -> Result<()> {
        let mut collections = self.collections.lock().await;
        let collection = collections
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("collection {}", id)))?;

        if collection.status != from {
            return Err(StoreError::Conflict(format!(
                "collection {} is {}, expected {}",
                id, collection.status, from
            )));
        }
        collection.status = to;
        if let Some(reason) = rejection_reason {
            collection.rejection_reason = Some(reason.to_string());
        }
        collection.updated_at = at;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn collection_at(collector: Uuid, minutes_ago: i64) -> Collection {
        let mut c = Collection::new_pending(collector, Uuid::new_v4());
        c.created_at = OffsetDateTime::now_utc() - Duration::minutes(minutes_ago);
        c
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_paginated() {
        let store = MemoryStore::new();
        let collector = Uuid::new_v4();
        let old = collection_at(collector, 30);
        let mid = collection_at(collector, 20);
        let new = collection_at(collector, 10);
        for c in [&old, &new, &mid] {
            store.insert_collection(c).await.unwrap();
        }

        let all = store.list_collections(&CollectionFilter::default()).await.unwrap();
        let ids: Vec<Uuid> = all.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![new.id, mid.id, old.id]);

        let page = store
            .list_collections(&CollectionFilter {
                limit: Some(1),
                offset: Some(1),
                ..CollectionFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, mid.id);
    }

    #[tokio::test]
    async fn test_status_update_is_compare_and_set() {
        let store = MemoryStore::new();
        let c = collection_at(Uuid::new_v4(), 0);
        store.insert_collection(&c).await.unwrap();
        let now = OffsetDateTime::now_utc();

        store
            .update_status(c.id, CollectionStatus::Pending, CollectionStatus::Approved, None, now)
            .await
            .unwrap();

        let second = store
            .update_status(c.id, CollectionStatus::Pending, CollectionStatus::Rejected, Some("dup"), now)
            .await;
        assert!(matches!(second, Err(StoreError::Conflict(_))));

        let missing = store
            .update_status(Uuid::new_v4(), CollectionStatus::Pending, CollectionStatus::Approved, None, now)
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_injected_line_item_failure_leaves_parent() {
        let store = MemoryStore::new();
        store.fail_line_item_writes.store(true, Ordering::SeqCst);

        let c = collection_at(Uuid::new_v4(), 0);
        store.insert_collection(&c).await.unwrap();
        let err = store.insert_line_items(c.id, &[]).await.unwrap_err();

        assert!(err.is_retryable());
        let stored = store.get_collection(c.id).await.unwrap().unwrap();
        assert!(stored.line_items.is_empty());
    }
}
