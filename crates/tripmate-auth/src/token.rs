//! JWT access token issuance and verification.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tripmate_core::models::user::{Actor, Role};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// JWT claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject — user ID (UUID string).
    pub sub: String,
    /// `USER` or `ADMIN`.
    pub role: String,
    /// Whether the identity provider verified the account.
    #[serde(default)]
    pub verified: bool,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
}

impl AccessTokenClaims {
    /// The caller these claims describe.
    pub fn to_actor(&self) -> Result<Actor, AuthError> {
        let user_id = Uuid::parse_str(&self.sub)
            .map_err(|e| AuthError::TokenInvalid(format!("sub is not a UUID: {e}")))?;
        let role: Role = self
            .role
            .parse()
            .map_err(|_| AuthError::TokenInvalid(format!("unknown role: {}", self.role)))?;
        Ok(Actor {
            user_id,
            role,
            verified: self.verified,
        })
    }
}

/// Issue a signed EdDSA (Ed25519) JWT access token for `actor`.
pub fn issue_access_token(actor: &Actor, config: &AuthConfig) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = AccessTokenClaims {
        sub: actor.user_id.to_string(),
        role: actor.role.as_str().to_string(),
        verified: actor.verified,
        iss: config.jwt_issuer.clone(),
        iat: now,
        exp: now + config.access_token_lifetime_secs as i64,
        jti: Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_ed_pem(config.jwt_private_key_pem.as_bytes())
        .map_err(|e| AuthError::Crypto(format!("bad private key: {e}")))?;

    let header = Header::new(Algorithm::EdDSA);
    jsonwebtoken::encode(&header, &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Verification material loaded once from an [`AuthConfig`].
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let key = DecodingKey::from_ed_pem(config.jwt_public_key_pem.as_bytes())
            .map_err(|e| AuthError::Crypto(format!("bad public key: {e}")))?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_issuer(&[&config.jwt_issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        Ok(Self { key, validation })
    }

    /// Verify signature, expiry and issuer, and return the claims.
    pub fn decode(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        jsonwebtoken::decode::<AccessTokenClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(e.to_string()),
            })
    }
}

/// Decode and verify an EdDSA JWT access token.
pub fn decode_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<AccessTokenClaims, AuthError> {
    TokenVerifier::new(config)?.decode(token)
}
