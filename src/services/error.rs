use thiserror::Error;

use crate::adapters::AdapterError;
use crate::db::DatabaseError;

/// Shared failure type for every domain service. `Boundary` maps this to
/// the stable HTTP error-code table.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("external service unavailable: {0}")]
    Unavailable(#[from] AdapterError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("session expired")]
    SessionExpired,

    #[error("session already {status}")]
    SessionNotActive { status: &'static str },
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}
