use thiserror::Error;
use uuid::Uuid;

use woza_core::validation::ValidationError;
use woza_db::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Input problems the user can fix; nothing was written.
    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    /// The parent record exists but its line items do not.
    #[error("Collection {collection_id} was created but is incomplete: {source}")]
    Incomplete {
        collection_id: Uuid,
        source: StoreError,
    },

    #[error("Collection {0} has no line items and must be reconciled first")]
    Unreconciled(Uuid),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Domain(#[from] woza_core::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Photo storage error: {0}")]
    Photo(String),

    #[error("Photo storage is not configured")]
    PhotosDisabled,
}

impl ServiceError {
    /// True when repeating the same request unchanged may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Store(e) => e.is_retryable(),
            ServiceError::Photo(_) => true,
            _ => false,
        }
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ServiceError>;
