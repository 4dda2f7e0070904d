//! Premium checkout domain model.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TripmateError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum PremiumTier {
    Monthly,
    Yearly,
}

impl PremiumTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PremiumTier::Monthly => "MONTHLY",
            PremiumTier::Yearly => "YEARLY",
        }
    }

    /// How long premium lasts once a checkout for this tier is paid.
    pub fn period(&self) -> Duration {
        match self {
            PremiumTier::Monthly => Duration::days(30),
            PremiumTier::Yearly => Duration::days(365),
        }
    }
}

impl FromStr for PremiumTier {
    type Err = TripmateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MONTHLY" => Ok(PremiumTier::Monthly),
            "YEARLY" => Ok(PremiumTier::Yearly),
            other => Err(TripmateError::validation(format!(
                "unknown premium tier: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckoutStatus {
    Pending,
    Paid,
}

impl CheckoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStatus::Pending => "PENDING",
            CheckoutStatus::Paid => "PAID",
        }
    }
}

impl FromStr for CheckoutStatus {
    type Err = TripmateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(CheckoutStatus::Pending),
            "PAID" => Ok(CheckoutStatus::Paid),
            other => Err(TripmateError::validation(format!(
                "unknown checkout status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tier: PremiumTier,
    /// Session identifier issued by the payment provider.
    pub provider_session_id: String,
    pub checkout_url: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
    pub status: CheckoutStatus,
    pub premium_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCheckoutSession {
    pub user_id: Uuid,
    pub tier: PremiumTier,
    pub provider_session_id: String,
    pub checkout_url: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
}
