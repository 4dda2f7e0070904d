//! Payment gate: premium checkout through an external provider.
//!
//! Independent of the join request state machine. Premium status only
//! ever comes from a checkout the provider reported as paid.

use chrono::{DateTime, Utc};
use tracing::info;
use tripmate_core::collaborator::{CheckoutRequest, PaymentProvider};
use tripmate_core::error::{TripmateError, TripmateResult};
use tripmate_core::models::checkout::{
    CheckoutSession, CheckoutStatus, CreateCheckoutSession, PremiumTier,
};
use tripmate_core::models::user::Actor;
use tripmate_core::policy::{is_admin, is_self, require};
use tripmate_core::repository::CheckoutRepository;
use uuid::Uuid;

/// Premium pricing.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Price of the 30-day tier in minor units (default: 999).
    pub monthly_price_cents: i64,
    /// Price of the 365-day tier in minor units (default: 9999).
    pub yearly_price_cents: i64,
    /// ISO 4217 currency code, lowercase (default: "usd").
    pub currency: String,
}

impl PaymentConfig {
    pub fn price_of(&self, tier: PremiumTier) -> i64 {
        match tier {
            PremiumTier::Monthly => self.monthly_price_cents,
            PremiumTier::Yearly => self.yearly_price_cents,
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            monthly_price_cents: 999,
            yearly_price_cents: 9999,
            currency: "usd".into(),
        }
    }
}

/// Whether `user_id` holds premium at `now`.
pub(crate) async fn premium_active<C: CheckoutRepository>(
    checkouts: &C,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> TripmateResult<bool> {
    Ok(checkouts
        .premium_until(user_id)
        .await?
        .is_some_and(|until| until > now))
}

pub struct PaymentGate<C: CheckoutRepository, P: PaymentProvider> {
    checkouts: C,
    provider: P,
    config: PaymentConfig,
}

impl<C: CheckoutRepository, P: PaymentProvider> PaymentGate<C, P> {
    pub fn new(checkouts: C, provider: P, config: PaymentConfig) -> Self {
        Self {
            checkouts,
            provider,
            config,
        }
    }

    /// Open a provider checkout for `tier` and record it as pending.
    pub async fn start_checkout(
        &self,
        actor: &Actor,
        tier: PremiumTier,
    ) -> TripmateResult<CheckoutSession> {
        let amount_cents = self.config.price_of(tier);
        let session = self
            .provider
            .create_session(CheckoutRequest {
                user_id: actor.user_id,
                tier,
                amount_cents,
                currency: self.config.currency.clone(),
            })
            .await?;

        let checkout = self
            .checkouts
            .create(CreateCheckoutSession {
                user_id: actor.user_id,
                tier,
                provider_session_id: session.session_id,
                checkout_url: session.checkout_url,
                amount_cents,
                currency: self.config.currency.clone(),
            })
            .await?;

        info!(
            checkout_id = %checkout.id,
            user_id = %actor.user_id,
            tier = tier.as_str(),
            "Checkout started"
        );
        Ok(checkout)
    }

    /// Ask the provider whether the checkout was paid and, if so, grant
    /// premium. Confirming an already paid checkout returns it unchanged.
    pub async fn confirm_checkout(
        &self,
        actor: &Actor,
        session_id: &str,
    ) -> TripmateResult<CheckoutSession> {
        let checkout = self.checkouts.get_by_provider_session(session_id).await?;
        require(
            is_self(actor, checkout.user_id) || is_admin(actor),
            "only the purchaser or an admin may confirm a checkout",
        )?;

        if checkout.status == CheckoutStatus::Paid {
            return Ok(checkout);
        }

        let status = self.provider.verify_session(session_id).await?;
        if !status.paid {
            return Ok(checkout);
        }

        // Time already bought is extended, not overwritten.
        let now = Utc::now();
        let start = self
            .checkouts
            .premium_until(checkout.user_id)
            .await?
            .filter(|until| *until > now)
            .unwrap_or(now);
        let premium_until = start + checkout.tier.period();

        match self.checkouts.mark_paid(checkout.id, premium_until).await {
            Ok(paid) => {
                info!(
                    checkout_id = %paid.id,
                    user_id = %paid.user_id,
                    %premium_until,
                    "Premium granted"
                );
                Ok(paid)
            }
            // A concurrent confirmation won; report what it stored.
            Err(TripmateError::InvalidState { .. }) => {
                self.checkouts.get_by_provider_session(session_id).await
            }
            Err(e) => Err(e),
        }
    }

    pub async fn is_premium(&self, user_id: Uuid) -> TripmateResult<bool> {
        premium_active(&self.checkouts, user_id, Utc::now()).await
    }

    pub async fn premium_until(&self, user_id: Uuid) -> TripmateResult<Option<DateTime<Utc>>> {
        self.checkouts.premium_until(user_id).await
    }
}
