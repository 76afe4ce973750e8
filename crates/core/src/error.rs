use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid step {step}: wizard has {total} steps")]
    InvalidStep { step: usize, total: usize },

    #[error("Reorder rejected: {0}")]
    Reorder(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Import failed: {0}")]
    Import(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
