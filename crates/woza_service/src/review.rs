use time::OffsetDateTime;
use uuid::Uuid;

use woza_core::models::collection::{Collection, CollectionStatus};
use woza_core::models::session::{Permission, Session};
use woza_core::validation::{Severity, ValidationError};

use crate::error::{Result, ServiceError};
use crate::events::StatusChanged;
use crate::WozaService;

impl WozaService {
    pub async fn approve_collection(&self, session: &Session, id: Uuid) -> Result<Collection> {
        self.change_status(session, id, CollectionStatus::Approved, None).await
    }

    pub async fn reject_collection(&self, session: &Session, id: Uuid, reason: &str) -> Result<Collection> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ServiceError::Validation(vec![ValidationError {
                code: "REV-001".to_string(),
                severity: Severity::Error,
                message: "A rejection needs a reason".to_string(),
                field: Some("reason".to_string()),
            }]));
        }
        self.change_status(session, id, CollectionStatus::Rejected, Some(reason)).await
    }

    /// Marks the payout as made.
    pub async fn complete_collection(&self, session: &Session, id: Uuid) -> Result<Collection> {
        self.change_status(session, id, CollectionStatus::Completed, None).await
    }

    async fn change_status(
        &self,
        session: &Session,
        id: Uuid,
        to: CollectionStatus,
        reason: Option<&str>,
    ) -> Result<Collection> {
        session.require(Permission::ReviewCollections)?;

        let current = self
            .store
            .get_collection(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("collection {}", id)))?;

        let from = current.status;
        from.transition(to)?;

        // A parent without rows was never fully written. It may still be rejected.
        if to != CollectionStatus::Rejected && current.line_items.is_empty() {
            tracing::warn!(collection_id = %id, "refusing to advance an incomplete collection");
            return Err(ServiceError::Unreconciled(id));
        }

        let at = OffsetDateTime::now_utc();
        self.store.update_status(id, from, to, reason, at).await?;

        // The write is committed; everything below is infallible.
        let mut updated = current;
        updated.status = to;
        if let Some(reason) = reason {
            updated.rejection_reason = Some(reason.to_string());
        }
        updated.updated_at = at;

        self.publish(StatusChanged::moved(&updated, from, at));
        tracing::info!(
            collection_id = %id,
            reviewer = %session.user_id,
            from = %from,
            to = %to,
            "collection status changed"
        );

        Ok(updated)
    }
}
