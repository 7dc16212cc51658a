use sea_orm::DbErr;
use thiserror::Error;

use crate::entity::source_kind::SourceKind;
use crate::error::MirrorError;

/// Errors that can occur during mirror store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Item not found.
    #[error("Item not found: {context}")]
    NotFound { context: String },

    /// Invalid input data.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Body exceeds the storage limit. Oversized bodies are rejected, never
    /// silently truncated.
    #[error("Body too large: {size} bytes (limit {max})")]
    BodyTooLarge { size: usize, max: usize },
}

impl StoreError {
    /// Create a NotFound error for a natural key lookup.
    pub fn not_found_by_key(kind: SourceKind, remote_id: &str) -> Self {
        Self::NotFound {
            context: format!("{}/{}", kind, remote_id),
        }
    }
}

/// Every store failure maps into exactly one taxonomy category so the sync
/// orchestrator can aggregate item-level failures uniformly.
impl From<StoreError> for MirrorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => MirrorError::network("mirror", e.to_string()),
            StoreError::NotFound { context } => MirrorError::not_found("mirror", context),
            StoreError::InvalidInput { message } => {
                MirrorError::validation("mirror", "input", message)
            }
            StoreError::BodyTooLarge { size, max } => {
                MirrorError::validation("mirror", "body", format!("{size} bytes exceeds {max}"))
            }
        }
    }
}

/// Result type alias for mirror store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
