//! Authentication error types.

use thiserror::Error;
use tripmate_core::error::TripmateError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("identity resolution timed out after {0} ms")]
    Timeout(u64),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for TripmateError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_)
            | AuthError::Timeout(_) => TripmateError::AuthenticationFailed {
                reason: err.to_string(),
            },
            // A key that cannot be loaded is an operator problem, not the
            // caller's.
            AuthError::Crypto(msg) => TripmateError::Internal(msg),
        }
    }
}
