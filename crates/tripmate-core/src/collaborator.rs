//! Contracts for the external collaborators the core depends on.
//!
//! Identity issuance, email delivery, binary storage and billing all
//! live outside this system; the services reach them only through these
//! traits.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TripmateResult;
use crate::models::checkout::PremiumTier;
use crate::models::user::Actor;

/// Maps an inbound credential (bearer token, session id) to an identity.
pub trait IdentityResolver: Send + Sync {
    /// Fails with `AuthenticationFailed` when no identity can be
    /// established.
    fn resolve(&self, credential: &str) -> impl Future<Output = TripmateResult<Actor>> + Send;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationTemplate {
    /// Sent to the plan owner when someone asks to join.
    JoinRequestReceived,
    JoinRequestApproved,
    JoinRequestRejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub recipient_id: Uuid,
    pub template: NotificationTemplate,
    pub data: serde_json::Value,
}

/// Best-effort delivery. Callers log failures and carry on.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> impl Future<Output = TripmateResult<()>> + Send;
}

/// Stores an uploaded binary and returns its public URL.
pub trait AssetStore: Send + Sync {
    fn store(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = TripmateResult<String>> + Send;
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: Uuid,
    pub tier: PremiumTier,
    pub amount_cents: i64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub session_id: String,
    /// Where the client completes payment, when the provider hosts it.
    pub checkout_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentStatus {
    pub paid: bool,
}

pub trait PaymentProvider: Send + Sync {
    fn create_session(
        &self,
        request: CheckoutRequest,
    ) -> impl Future<Output = TripmateResult<ProviderSession>> + Send;
    fn verify_session(
        &self,
        session_id: &str,
    ) -> impl Future<Output = TripmateResult<PaymentStatus>> + Send;
}
