//! Database-specific error types and conversions.

use std::fmt::Display;

use tripmate_core::error::TripmateError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Corrupt record: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Write refused: {0}")]
    Rejected(String),

    #[error("Unique constraint violated on {entity}")]
    Conflict { entity: String },

    #[error("{entity} {id} is {found}, expected {expected}")]
    StaleState {
        entity: String,
        id: String,
        expected: String,
        found: String,
    },
}

impl DbError {
    /// Classify a failed write. SurrealDB reports unique index
    /// violations as "Database index `…` already contains …".
    pub(crate) fn from_write(entity: &str, err: impl Display) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            DbError::Conflict {
                entity: entity.into(),
            }
        } else {
            DbError::Query(message)
        }
    }

    pub(crate) fn decode(what: &str, err: impl Display) -> Self {
        DbError::Decode(format!("{what}: {err}"))
    }
}

impl From<DbError> for TripmateError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => TripmateError::NotFound { entity, id },
            DbError::Conflict { entity } => TripmateError::AlreadyExists { entity },
            DbError::Rejected(message) => TripmateError::Validation { message },
            stale @ DbError::StaleState { .. } => TripmateError::InvalidState {
                message: stale.to_string(),
            },
            other => TripmateError::Database(other.to_string()),
        }
    }
}
