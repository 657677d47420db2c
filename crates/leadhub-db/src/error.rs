//! Database-specific error types and conversions.

use leadhub_core::error::LeadHubError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for LeadHubError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => LeadHubError::NotFound { entity, id },
            other => LeadHubError::Database(other.to_string()),
        }
    }
}
