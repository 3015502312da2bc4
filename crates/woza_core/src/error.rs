use thiserror::Error;

use crate::models::collection::CollectionStatus;
use crate::models::session::{Permission, Role};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown collection status: {0}")]
    UnknownStatus(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Collection cannot move from {from} to {to}")]
    InvalidTransition {
        from: CollectionStatus,
        to: CollectionStatus,
    },

    #[error("Role '{role}' is not permitted to {permission}")]
    Forbidden { role: Role, permission: Permission },
}

pub type Result<T> = std::result::Result<T, Error>;
