use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

use woza_core::models::collection::{Collection, CollectionDraft, CollectionStatus, LineItem};
use woza_core::models::material::Material;
use woza_core::models::session::{Role, Session};
use woza_core::{default_materials, ImpactEntry, ImpactParams};
use woza_db::{CollectionFilter, CollectionStore, MemoryStore, StoreError};
use woza_service::materials::MaterialUpdate;
use woza_service::{ServiceError, WozaService};

fn setup() -> (WozaService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_materials(default_materials()));
    let service = WozaService::new(store.clone(), ImpactParams::default());
    (service, store)
}

fn admin() -> Session {
    Session::login(Uuid::new_v4(), Role::Admin)
}

fn collector() -> Session {
    Session::login(Uuid::new_v4(), Role::Collector)
}

async fn all_collections(store: &MemoryStore) -> usize {
    store
        .list_collections(&CollectionFilter::default())
        .await
        .unwrap()
        .len()
}

#[tokio::test]
async fn test_submit_persists_priced_line_items() {
    let (service, store) = setup();
    let session = collector();
    let customer = Uuid::new_v4();
    let mut events = service.subscribe();

    let draft = CollectionDraft::for_customer(customer)
        .entry("aluminium", 2.5)
        .entry("glass", 0.0);
    let receipt = service.submit_collection(&session, draft).await.unwrap();

    assert_eq!(receipt.status, CollectionStatus::Pending);
    assert_eq!(receipt.impact.total_value, 30.0);
    assert_eq!(receipt.impact.points_earned, 15.0);
    // The zero row is accepted with a warning
    assert_eq!(receipt.warnings.len(), 1);
    assert_eq!(receipt.warnings[0].code, "COL-006");

    let stored = store.get_collection(receipt.collection_id).await.unwrap().unwrap();
    assert_eq!(stored.collector_id, session.user_id);
    assert_eq!(stored.customer_id, customer);
    assert_eq!(stored.line_items.len(), 1);
    assert_eq!(stored.line_items[0].unit_price, 12.0);
    assert_eq!(stored.total_weight_kg, 2.5);

    let event = events.recv().await.unwrap();
    assert_eq!(event.collection_id, receipt.collection_id);
    assert_eq!(event.from, None);
    assert_eq!(event.to, CollectionStatus::Pending);
}

#[tokio::test]
async fn test_validation_failure_writes_nothing() {
    let (service, store) = setup();

    let draft = CollectionDraft::default().entry("copper", 3.0);
    let err = service.submit_collection(&collector(), draft).await.unwrap_err();
    assert!(!err.is_retryable());

    match err {
        ServiceError::Validation(findings) => {
            let codes: Vec<_> = findings.iter().map(|f| f.code.as_str()).collect();
            assert_eq!(codes, vec!["COL-001", "COL-004"]);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(all_collections(&store).await, 0);
}

#[tokio::test]
async fn test_parent_write_failure_is_retryable_and_leaves_nothing() {
    let (service, store) = setup();
    store.fail_collection_writes.store(true, Ordering::SeqCst);
    let mut events = service.subscribe();

    let draft = CollectionDraft::for_customer(Uuid::new_v4()).entry("pet", 1.0);
    let err = service.submit_collection(&collector(), draft).await.unwrap_err();

    assert!(matches!(err, ServiceError::Store(_)));
    assert!(err.is_retryable());
    assert_eq!(all_collections(&store).await, 0);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_line_item_failure_reports_incomplete() {
    let (service, store) = setup();
    store.fail_line_item_writes.store(true, Ordering::SeqCst);
    let mut events = service.subscribe();

    let draft = CollectionDraft::for_customer(Uuid::new_v4()).entry("pet", 1.0);
    let err = service.submit_collection(&collector(), draft).await.unwrap_err();
    // Retrying would create a second parent record
    assert!(!err.is_retryable());

    let collection_id = match err {
        ServiceError::Incomplete { collection_id, .. } => collection_id,
        other => panic!("expected incomplete, got {:?}", other),
    };

    // Parent is there, rows are not, and nobody was told about it
    let stored = store.get_collection(collection_id).await.unwrap().unwrap();
    assert!(stored.line_items.is_empty());
    assert!(events.try_recv().is_err());

    // It cannot be approved until someone reconciles it
    let err = service.approve_collection(&admin(), collection_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Unreconciled(id) if id == collection_id));
}

#[tokio::test]
async fn test_customer_cannot_submit() {
    let (service, store) = setup();
    let customer = Session::login(Uuid::new_v4(), Role::Customer);

    let draft = CollectionDraft::for_customer(customer.user_id).entry("pet", 1.0);
    let err = service.submit_collection(&customer, draft).await.unwrap_err();

    assert!(matches!(err, ServiceError::Domain(woza_core::Error::Forbidden { .. })));
    assert_eq!(all_collections(&store).await, 0);
}

#[tokio::test]
async fn test_status_flow_publishes_each_change() {
    let (service, _store) = setup();
    let reviewer = admin();
    let draft = CollectionDraft::for_customer(Uuid::new_v4()).entry("cardboard", 10.0);
    let receipt = service.submit_collection(&collector(), draft).await.unwrap();

    let mut events = service.subscribe();

    let approved = service.approve_collection(&reviewer, receipt.collection_id).await.unwrap();
    assert_eq!(approved.status, CollectionStatus::Approved);

    let completed = service.complete_collection(&reviewer, receipt.collection_id).await.unwrap();
    assert_eq!(completed.status, CollectionStatus::Completed);

    let first = events.recv().await.unwrap();
    assert_eq!(first.from, Some(CollectionStatus::Pending));
    assert_eq!(first.to, CollectionStatus::Approved);
    let second = events.recv().await.unwrap();
    assert_eq!(second.from, Some(CollectionStatus::Approved));
    assert_eq!(second.to, CollectionStatus::Completed);

    // Completed is final
    let err = service
        .reject_collection(&reviewer, receipt.collection_id, "late")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(woza_core::Error::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_reject_requires_reason_and_stores_it() {
    let (service, _store) = setup();
    let reviewer = admin();
    let draft = CollectionDraft::for_customer(Uuid::new_v4()).entry("glass", 4.0);
    let receipt = service.submit_collection(&collector(), draft).await.unwrap();

    let err = service
        .reject_collection(&reviewer, receipt.collection_id, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let rejected = service
        .reject_collection(&reviewer, receipt.collection_id, "photos do not match weights")
        .await
        .unwrap();
    assert_eq!(rejected.status, CollectionStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("photos do not match weights"));
}

#[tokio::test]
async fn test_collector_cannot_review() {
    let (service, _store) = setup();
    let session = collector();
    let draft = CollectionDraft::for_customer(Uuid::new_v4()).entry("glass", 4.0);
    let receipt = service.submit_collection(&session, draft).await.unwrap();

    let err = service
        .approve_collection(&session, receipt.collection_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(woza_core::Error::Forbidden { .. })));
}

#[tokio::test]
async fn test_visibility_is_scoped_by_role() {
    let (service, _store) = setup();
    let alice = collector();
    let bob = collector();
    let resident = Session::login(Uuid::new_v4(), Role::Customer);

    let mine = service
        .submit_collection(&alice, CollectionDraft::for_customer(resident.user_id).entry("pet", 1.0))
        .await
        .unwrap();
    service
        .submit_collection(&bob, CollectionDraft::for_customer(Uuid::new_v4()).entry("pet", 2.0))
        .await
        .unwrap();

    let everything = CollectionFilter::default();
    assert_eq!(service.list_collections(&admin(), &everything).await.unwrap().len(), 2);
    assert_eq!(service.list_collections(&alice, &everything).await.unwrap().len(), 1);
    assert_eq!(service.list_collections(&resident, &everything).await.unwrap().len(), 1);

    // Asking for another collector's records is refused
    let err = service
        .list_collections(&alice, &CollectionFilter::for_collector(bob.user_id))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(woza_core::Error::Forbidden { .. })));

    // Someone else's record looks missing
    assert!(service.get_collection(&resident, mine.collection_id).await.is_ok());
    let err = service.get_collection(&bob, mine.collection_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_dashboard_excludes_rejected_totals() {
    let (service, _store) = setup();
    let reviewer = admin();
    let session = collector();

    let kept = service
        .submit_collection(&session, CollectionDraft::for_customer(Uuid::new_v4()).entry("aluminium", 2.0))
        .await
        .unwrap();
    let dropped = service
        .submit_collection(&session, CollectionDraft::for_customer(Uuid::new_v4()).entry("aluminium", 40.0))
        .await
        .unwrap();
    service.approve_collection(&reviewer, kept.collection_id).await.unwrap();
    service
        .reject_collection(&reviewer, dropped.collection_id, "duplicate")
        .await
        .unwrap();

    let overview = service
        .dashboard_overview(&reviewer, &CollectionFilter::default())
        .await
        .unwrap();

    assert_eq!(overview.stats.collection_count, 2);
    assert_eq!(overview.stats.approved, 1);
    assert_eq!(overview.stats.rejected, 1);
    assert_eq!(overview.stats.total_weight_kg, 2.0);
    assert_eq!(overview.stats.total_value, 24.0);
    assert_eq!(overview.trend.len(), 1);
    assert_eq!(overview.materials.len(), 1);
    assert_eq!(overview.materials[0].weight_kg, 2.0);

    let board = service
        .collector_leaderboard(&reviewer, &CollectionFilter::default(), 5)
        .await
        .unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].collector_id, session.user_id);

    let err = service
        .collector_leaderboard(&session, &CollectionFilter::default(), 5)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(woza_core::Error::Forbidden { .. })));
}

#[tokio::test]
async fn test_material_admin() {
    let (service, _store) = setup();
    let office = admin();

    let created = service
        .create_material(&office, Material::new("Copper", "Copper", 55.0).with_impact(3.0, 0.0, 1.0))
        .await
        .unwrap();
    assert_eq!(created.id, "copper");

    let duplicate = service
        .create_material(&office, Material::new("copper", "Copper", 50.0))
        .await
        .unwrap_err();
    assert!(matches!(duplicate, ServiceError::Store(woza_db::StoreError::Conflict(_))));

    let updated = service
        .update_material(
            &office,
            "copper",
            MaterialUpdate {
                unit_price_per_kg: Some(60.0),
                ..MaterialUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.unit_price_per_kg, 60.0);

    let impact = service
        .compute_impact(&[ImpactEntry::new("copper", 1.0)])
        .await
        .unwrap();
    assert_eq!(impact.total_value, 60.0);

    service.deactivate_material(&office, "copper").await.unwrap();
    let impact = service
        .compute_impact(&[ImpactEntry::new("copper", 1.0)])
        .await
        .unwrap();
    assert_eq!(impact.total_value, 0.0);
    assert_eq!(impact.total_weight_kg, 1.0);

    let active = service.list_materials(&collector(), false).await.unwrap();
    assert!(active.iter().all(|m| m.id != "copper"));
    assert!(service.list_materials(&collector(), true).await.is_err());
    assert!(service
        .list_materials(&office, true)
        .await
        .unwrap()
        .iter()
        .any(|m| m.id == "copper"));

    let missing = service.deactivate_material(&office, "unobtainium").await.unwrap_err();
    assert!(matches!(missing, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_upload_photo_without_vault() {
    let (service, _store) = setup();

    let err = service
        .upload_photo(&collector(), vec![0xFF, 0xD8], "image/jpeg")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PhotosDisabled));

    let err = service
        .upload_photo(&collector(), vec![1, 2, 3], "text/plain")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_preview_reports_totals_and_findings_without_writing() {
    let (service, store) = setup();
    let draft = CollectionDraft::default()
        .entry("aluminium", 2.5)
        .entry("glass", 0.0);

    let preview = service.preview_collection(&collector(), &draft).await.unwrap();

    assert_eq!(preview.impact.total_value, 30.0);
    assert_eq!(preview.impact.total_weight_kg, 2.5);
    let codes: Vec<_> = preview.findings.iter().map(|f| f.code.as_str()).collect();
    assert!(codes.contains(&"COL-001"));
    assert!(codes.contains(&"COL-006"));
    assert_eq!(all_collections(&store).await, 0);

    let customer = Session::login(Uuid::new_v4(), Role::Customer);
    let err = service.preview_collection(&customer, &draft).await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(woza_core::Error::Forbidden { .. })));
}

/// Delegates to a `MemoryStore` but stops answering reads once a status
/// update has been committed.
struct ReadsFailAfterUpdate {
    inner: MemoryStore,
    updated: AtomicBool,
}

#[async_trait]
impl CollectionStore for ReadsFailAfterUpdate {
    fn backend_tag(&self) -> &'static str {
        "reads-fail-after-update"
    }

    async fn list_materials(&self, include_inactive: bool) -> woza_db::Result<Vec<Material>> {
        self.inner.list_materials(include_inactive).await
    }

    async fn get_material(&self, id: &str) -> woza_db::Result<Option<Material>> {
        self.inner.get_material(id).await
    }

    async fn upsert_material(&self, material: &Material) -> woza_db::Result<()> {
        self.inner.upsert_material(material).await
    }

    async fn set_material_active(&self, id: &str, active: bool) -> woza_db::Result<()> {
        self.inner.set_material_active(id, active).await
    }

    async fn insert_collection(&self, collection: &Collection) -> woza_db::Result<()> {
        self.inner.insert_collection(collection).await
    }

    async fn insert_line_items(&self, collection_id: Uuid, items: &[LineItem]) -> woza_db::Result<()> {
        self.inner.insert_line_items(collection_id, items).await
    }

    async fn get_collection(&self, id: Uuid) -> woza_db::Result<Option<Collection>> {
        if self.updated.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.get_collection(id).await
    }

    async fn list_collections(&self, filter: &CollectionFilter) -> woza_db::Result<Vec<Collection>> {
        self.inner.list_collections(filter).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: CollectionStatus,
        to: CollectionStatus,
        rejection_reason: Option<&str>,
        at: OffsetDateTime,
    ) -> woza_db::Result<()> {
        self.inner.update_status(id, from, to, rejection_reason, at).await?;
        self.updated.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_committed_status_change_is_published_even_if_reads_fail_afterwards() {
    let store = Arc::new(ReadsFailAfterUpdate {
        inner: MemoryStore::with_materials(default_materials()),
        updated: AtomicBool::new(false),
    });
    let service = WozaService::new(store.clone(), ImpactParams::default());
    let draft = CollectionDraft::for_customer(Uuid::new_v4()).entry("tin", 4.0);
    let receipt = service.submit_collection(&collector(), draft).await.unwrap();
    let mut events = service.subscribe();

    let rejected = service
        .reject_collection(&admin(), receipt.collection_id, "contaminated")
        .await
        .unwrap();

    assert_eq!(rejected.status, CollectionStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("contaminated"));
    assert_eq!(rejected.line_items.len(), 1);

    let event = events.try_recv().unwrap();
    assert_eq!(event.collection_id, receipt.collection_id);
    assert_eq!(event.from, Some(CollectionStatus::Pending));
    assert_eq!(event.to, CollectionStatus::Rejected);

    store.updated.store(false, Ordering::SeqCst);
    let stored = store.get_collection(receipt.collection_id).await.unwrap().unwrap();
    assert_eq!(stored.status, CollectionStatus::Rejected);
}
