//! Tripmate Auth — EdDSA JWT verification behind the core
//! `IdentityResolver` contract.

pub mod config;
pub mod error;
pub mod resolver;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use resolver::{JwtIdentityResolver, TimedResolver};
pub use token::AccessTokenClaims;
