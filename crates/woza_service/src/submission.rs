use serde::Serialize;
use uuid::Uuid;

use woza_core::impact::{ImpactEntry, ImpactResult};
use woza_core::models::collection::{Collection, CollectionDraft, CollectionStatus, LineItem};
use woza_core::models::session::{Permission, Session};
use woza_core::rates::{normalize_material_id, RateTable};
use woza_core::submission_validator;
use woza_core::validation::{has_blocking, ValidationError};

use crate::error::{Result, ServiceError};
use crate::events::StatusChanged;
use crate::WozaService;

/// Running totals for a form that has not been submitted yet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub impact: ImpactResult,
    pub findings: Vec<ValidationError>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub collection_id: Uuid,
    pub status: CollectionStatus,
    pub impact: ImpactResult,
    pub warnings: Vec<ValidationError>,
}

/// Prices each positive row at the current rate. Unknown materials keep a
/// zero price; validation has already rejected them before this is called.
fn price_line_items(draft: &CollectionDraft, rates: &RateTable) -> Vec<LineItem> {
    draft
        .positive_entries()
        .map(|entry| LineItem {
            material_id: normalize_material_id(&entry.material_id),
            weight_kg: entry.weight_kg,
            unit_price: rates.get(&entry.material_id).map_or(0.0, |r| r.unit_price_per_kg),
        })
        .collect()
}

impl WozaService {
    /// Values raw entries against the active catalogue. No session needed.
    pub async fn compute_impact(&self, entries: &[ImpactEntry]) -> Result<ImpactResult> {
        let rates = self.rate_table().await?;
        Ok(self.calculator(&rates).compute_impact(entries))
    }

    /// Totals plus every validation finding, without writing anything.
    pub async fn preview_collection(&self, session: &Session, draft: &CollectionDraft) -> Result<Preview> {
        session.require(Permission::SubmitCollection)?;

        let rates = self.rate_table().await?;
        Ok(Preview {
            impact: self.calculator(&rates).compute_impact(&draft.entries),
            findings: submission_validator().run(draft, &rates),
        })
    }

    pub async fn submit_collection(&self, session: &Session, draft: CollectionDraft) -> Result<SubmissionReceipt> {
        session.require(Permission::SubmitCollection)?;

        // 1. Validate against the catalogue as it stands now
        let rates = self.rate_table().await?;
        let findings = submission_validator().run(&draft, &rates);
        if has_blocking(&findings) {
            tracing::warn!(
                collector_id = %session.user_id,
                errors = findings.len(),
                "collection rejected by validation"
            );
            return Err(ServiceError::Validation(findings));
        }
        let customer_id = draft
            .customer_id
            .ok_or_else(|| ServiceError::NotFound("resident".to_string()))?;

        // 2. Freeze prices and derive totals from the rows we will persist
        let line_items = price_line_items(&draft, &rates);
        let impact = self.calculator(&rates).compute_line_items(&line_items);

        let mut collection = Collection::new_pending(session.user_id, customer_id);
        collection.total_weight_kg = impact.total_weight_kg;
        collection.total_value = impact.total_value;
        collection.photo_refs = draft.photo_refs;
        collection.notes = draft.notes;

        // 3. Parent record. A failure here leaves nothing behind.
        self.store.insert_collection(&collection).await?;

        // 4. Line items, immediately after the parent
        if let Err(source) = self.store.insert_line_items(collection.id, &line_items).await {
            tracing::error!(
                collection_id = %collection.id,
                collector_id = %collection.collector_id,
                error = %source,
                "collection created but line items failed to persist; manual reconciliation required"
            );
            return Err(ServiceError::Incomplete {
                collection_id: collection.id,
                source,
            });
        }

        // 5. Hand over to approval consumers
        self.publish(StatusChanged::submitted(&collection));
        tracing::info!(
            collection_id = %collection.id,
            weight_kg = impact.total_weight_kg,
            value = impact.total_value,
            "collection submitted"
        );

        Ok(SubmissionReceipt {
            collection_id: collection.id,
            status: collection.status,
            impact,
            warnings: findings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use woza_core::rates::MaterialRate;

    #[test]
    fn test_line_items_skip_zero_rows_and_normalize_ids() {
        let rates = RateTable::new().with_rate("pet", MaterialRate::priced(4.5));
        let draft = CollectionDraft::for_customer(Uuid::new_v4())
            .entry(" PET ", 2.0)
            .entry("pet", 0.0);

        let items = price_line_items(&draft, &rates);

        assert_eq!(
            items,
            vec![LineItem {
                material_id: "pet".to_string(),
                weight_kg: 2.0,
                unit_price: 4.5,
            }]
        );
    }
}
