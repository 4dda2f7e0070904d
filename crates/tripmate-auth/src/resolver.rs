//! [`IdentityResolver`] implementations.

use std::time::Duration;

use tracing::{debug, warn};
use tripmate_core::collaborator::IdentityResolver;
use tripmate_core::error::TripmateResult;
use tripmate_core::models::user::Actor;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token::TokenVerifier;

/// Resolves bearer JWTs issued by the identity provider.
///
/// Purely stateless: no database lookup is performed.
#[derive(Clone)]
pub struct JwtIdentityResolver {
    verifier: TokenVerifier,
}

impl JwtIdentityResolver {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        Ok(Self {
            verifier: TokenVerifier::new(config)?,
        })
    }
}

impl IdentityResolver for JwtIdentityResolver {
    async fn resolve(&self, credential: &str) -> TripmateResult<Actor> {
        let token = credential.trim();
        if token.is_empty() {
            return Err(AuthError::MissingCredential.into());
        }

        let claims = self.verifier.decode(token).inspect_err(|e| {
            debug!(error = %e, "Rejected access token");
        })?;
        Ok(claims.to_actor()?)
    }
}

/// Bounds an inner resolver with a timeout. A resolver that does not
/// answer in time yields `AuthenticationFailed`; the call is not retried.
#[derive(Clone)]
pub struct TimedResolver<R> {
    inner: R,
    timeout: Duration,
}

impl<R: IdentityResolver> TimedResolver<R> {
    pub fn new(inner: R, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl<R: IdentityResolver> IdentityResolver for TimedResolver<R> {
    async fn resolve(&self, credential: &str) -> TripmateResult<Actor> {
        match tokio::time::timeout(self.timeout, self.inner.resolve(credential)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let millis = self.timeout.as_millis() as u64;
                warn!(timeout_ms = millis, "Identity resolver timed out");
                Err(AuthError::Timeout(millis).into())
            }
        }
    }
}
