//! Error types for the tripmate system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TripmateError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Notification delivery failed: {0}")]
    NotificationDelivery(String),

    #[error("Asset storage failed: {0}")]
    AssetStorage(String),

    #[error("Payment provider error: {0}")]
    Payment(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TripmateError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self::AuthorizationDenied {
            reason: reason.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Whether the caller may retry the same operation unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

pub type TripmateResult<T> = Result<T, TripmateError>;
