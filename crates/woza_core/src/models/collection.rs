use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::impact::ImpactEntry;

// ---------------------------------------------------------------------------
// Status lifecycle
// pending -> approved | rejected, approved -> completed
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl CollectionStatus {
    pub const ALL: [CollectionStatus; 4] = [
        CollectionStatus::Pending,
        CollectionStatus::Approved,
        CollectionStatus::Rejected,
        CollectionStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionStatus::Pending => "pending",
            CollectionStatus::Approved => "approved",
            CollectionStatus::Rejected => "rejected",
            CollectionStatus::Completed => "completed",
        }
    }

    pub fn can_transition_to(self, next: CollectionStatus) -> bool {
        matches!(
            (self, next),
            (CollectionStatus::Pending, CollectionStatus::Approved)
                | (CollectionStatus::Pending, CollectionStatus::Rejected)
                | (CollectionStatus::Approved, CollectionStatus::Completed)
        )
    }

    pub fn transition(self, next: CollectionStatus) -> Result<CollectionStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::InvalidTransition { from: self, to: next })
        }
    }

    /// Line items are frozen once a collection leaves `pending`.
    pub fn is_finalized(self) -> bool {
        self != CollectionStatus::Pending
    }
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(CollectionStatus::Pending),
            "approved" => Ok(CollectionStatus::Approved),
            "rejected" => Ok(CollectionStatus::Rejected),
            "completed" => Ok(CollectionStatus::Completed),
            other => Err(Error::UnknownStatus(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Line item: one material row of a collection, priced at entry time
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub material_id: String,
    pub weight_kg: f64,
    pub unit_price: f64,
}

impl LineItem {
    pub fn line_value(&self) -> f64 {
        self.weight_kg * self.unit_price
    }
}

// ---------------------------------------------------------------------------
// Collection record
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: Uuid,
    pub collector_id: Uuid,
    pub customer_id: Uuid,
    pub status: CollectionStatus,

    #[serde(default)]
    pub line_items: Vec<LineItem>,

    pub total_weight_kg: f64,
    pub total_value: f64,

    #[serde(default)]
    pub photo_refs: Vec<String>,

    pub notes: Option<String>,
    pub rejection_reason: Option<String>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Collection {
    pub fn new_pending(collector_id: Uuid, customer_id: Uuid) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            collector_id,
            customer_id,
            status: CollectionStatus::Pending,
            line_items: Vec::new(),
            total_weight_kg: 0.0,
            total_value: 0.0,
            photo_refs: Vec::new(),
            notes: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Month bucket used by trend views, e.g. "2026-10".
    pub fn period(&self) -> String {
        format!("{:04}-{:02}", self.created_at.year(), u8::from(self.created_at.month()))
    }
}

// ---------------------------------------------------------------------------
// Draft: raw form input before validation and persistence
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDraft {
    pub customer_id: Option<Uuid>,

    #[serde(default)]
    pub entries: Vec<ImpactEntry>,

    #[serde(default)]
    pub photo_refs: Vec<String>,

    pub notes: Option<String>,
}

impl CollectionDraft {
    pub fn for_customer(customer_id: Uuid) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }

    pub fn entry(mut self, material_id: &str, weight_kg: f64) -> Self {
        self.entries.push(ImpactEntry::new(material_id, weight_kg));
        self
    }

    /// Rows that will actually be persisted.
    pub fn positive_entries(&self) -> impl Iterator<Item = &ImpactEntry> {
        self.entries.iter().filter(|e| e.counts())
    }
}
