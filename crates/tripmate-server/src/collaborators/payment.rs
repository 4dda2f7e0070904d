//! Payment providers: an in-process sandbox and Stripe Checkout.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use tracing::{debug, info};
use tripmate_core::collaborator::{
    CheckoutRequest, PaymentProvider, PaymentStatus, ProviderSession,
};
use tripmate_core::error::{TripmateError, TripmateResult};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Sandbox
// ---------------------------------------------------------------------------

/// Provider for local runs and tests. Sessions are paid either on
/// creation (`auto_pay`) or once [`SandboxPaymentProvider::complete`] is
/// called for them.
#[derive(Debug, Clone, Default)]
pub struct SandboxPaymentProvider {
    sessions: Arc<DashMap<String, bool>>,
    auto_pay: bool,
}

impl SandboxPaymentProvider {
    pub fn new(auto_pay: bool) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            auto_pay,
        }
    }

    /// Mark a session as paid. Returns false for unknown sessions.
    pub fn complete(&self, session_id: &str) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(mut paid) => {
                *paid = true;
                true
            }
            None => false,
        }
    }
}

impl PaymentProvider for SandboxPaymentProvider {
    async fn create_session(&self, request: CheckoutRequest) -> TripmateResult<ProviderSession> {
        let session_id = format!("sandbox_{}", Uuid::new_v4().simple());
        self.sessions.insert(session_id.clone(), self.auto_pay);
        debug!(
            %session_id,
            user_id = %request.user_id,
            amount_cents = request.amount_cents,
            "Sandbox checkout session created"
        );
        Ok(ProviderSession {
            session_id,
            checkout_url: None,
        })
    }

    async fn verify_session(&self, session_id: &str) -> TripmateResult<PaymentStatus> {
        let paid = self
            .sessions
            .get(session_id)
            .map(|paid| *paid)
            .ok_or_else(|| TripmateError::Payment(format!("unknown session {session_id}")))?;
        Ok(PaymentStatus { paid })
    }
}

// ---------------------------------------------------------------------------
// Stripe
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub api_base: String,
    /// Where Stripe sends the buyer after paying. `{CHECKOUT_SESSION_ID}`
    /// is substituted by Stripe.
    pub success_url: String,
    pub cancel_url: String,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            api_base: "https://api.stripe.com".into(),
            success_url: "http://localhost:8080/premium/success?session_id={CHECKOUT_SESSION_ID}"
                .into(),
            cancel_url: "http://localhost:8080/premium/cancel".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
}

/// Stripe Checkout over its REST API.
#[derive(Debug, Clone)]
pub struct StripePaymentProvider {
    http: reqwest::Client,
    config: StripeConfig,
}

impl StripePaymentProvider {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn sessions_url(&self) -> String {
        format!(
            "{}/v1/checkout/sessions",
            self.config.api_base.trim_end_matches('/')
        )
    }

    async fn read_session(&self, response: reqwest::Response) -> TripmateResult<StripeSession> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TripmateError::Payment(format!("stripe returned {status}: {body}")));
        }
        response
            .json::<StripeSession>()
            .await
            .map_err(|e| TripmateError::Payment(format!("unreadable stripe response: {e}")))
    }
}

impl PaymentProvider for StripePaymentProvider {
    async fn create_session(&self, request: CheckoutRequest) -> TripmateResult<ProviderSession> {
        let form = [
            ("mode", "payment".to_string()),
            ("success_url", self.config.success_url.clone()),
            ("cancel_url", self.config.cancel_url.clone()),
            ("client_reference_id", request.user_id.to_string()),
            ("metadata[tier]", request.tier.as_str().to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("line_items[0][price_data][currency]", request.currency.clone()),
            (
                "line_items[0][price_data][unit_amount]",
                request.amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                format!("Tripmate Premium ({})", request.tier.as_str().to_lowercase()),
            ),
        ];

        let response = self
            .http
            .post(self.sessions_url())
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| TripmateError::Payment(format!("stripe unreachable: {e}")))?;
        let session = self.read_session(response).await?;

        info!(
            session_id = %session.id,
            user_id = %request.user_id,
            "Stripe checkout session created"
        );
        Ok(ProviderSession {
            session_id: session.id,
            checkout_url: session.url,
        })
    }

    async fn verify_session(&self, session_id: &str) -> TripmateResult<PaymentStatus> {
        let response = self
            .http
            .get(format!("{}/{session_id}", self.sessions_url()))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| TripmateError::Payment(format!("stripe unreachable: {e}")))?;
        let session = self.read_session(response).await?;

        Ok(PaymentStatus {
            paid: session.payment_status.as_deref() == Some("paid"),
        })
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The provider chosen at startup.
#[derive(Debug, Clone)]
pub enum PaymentBackend {
    Sandbox(SandboxPaymentProvider),
    Stripe(StripePaymentProvider),
}

impl PaymentProvider for PaymentBackend {
    async fn create_session(&self, request: CheckoutRequest) -> TripmateResult<ProviderSession> {
        match self {
            PaymentBackend::Sandbox(p) => p.create_session(request).await,
            PaymentBackend::Stripe(p) => p.create_session(request).await,
        }
    }

    async fn verify_session(&self, session_id: &str) -> TripmateResult<PaymentStatus> {
        match self {
            PaymentBackend::Sandbox(p) => p.verify_session(session_id).await,
            PaymentBackend::Stripe(p) => p.verify_session(session_id).await,
        }
    }
}
