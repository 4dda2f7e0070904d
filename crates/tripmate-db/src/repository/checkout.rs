//! SurrealDB implementation of [`CheckoutRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use tripmate_core::error::TripmateResult;
use tripmate_core::models::checkout::{CheckoutSession, CreateCheckoutSession};
use tripmate_core::repository::CheckoutRepository;
use uuid::Uuid;

use super::{StatusRow, parse_enum, parse_uuid};
use crate::error::DbError;

const ENTITY: &str = "checkout_session";

#[derive(Debug, SurrealValue)]
struct CheckoutRow {
    user_id: String,
    tier: String,
    provider_session_id: String,
    checkout_url: Option<String>,
    amount_cents: i64,
    currency: String,
    status: String,
    premium_until: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CheckoutRowWithId {
    record_id: String,
    user_id: String,
    tier: String,
    provider_session_id: String,
    checkout_url: Option<String>,
    amount_cents: i64,
    currency: String,
    status: String,
    premium_until: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct PremiumRow {
    premium_until: Option<DateTime<Utc>>,
}

impl CheckoutRow {
    fn into_session(self, id: Uuid) -> Result<CheckoutSession, DbError> {
        Ok(CheckoutSession {
            id,
            user_id: parse_uuid("user", &self.user_id)?,
            tier: parse_enum("premium tier", &self.tier)?,
            provider_session_id: self.provider_session_id,
            checkout_url: self.checkout_url,
            amount_cents: self.amount_cents,
            currency: self.currency,
            status: parse_enum("checkout status", &self.status)?,
            premium_until: self.premium_until,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl CheckoutRowWithId {
    fn try_into_session(self) -> Result<CheckoutSession, DbError> {
        let id = parse_uuid("checkout session", &self.record_id)?;
        CheckoutRow {
            user_id: self.user_id,
            tier: self.tier,
            provider_session_id: self.provider_session_id,
            checkout_url: self.checkout_url,
            amount_cents: self.amount_cents,
            currency: self.currency,
            status: self.status,
            premium_until: self.premium_until,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_session(id)
    }
}

/// SurrealDB implementation of the checkout session repository.
#[derive(Clone)]
pub struct SurrealCheckoutRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCheckoutRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CheckoutRepository for SurrealCheckoutRepository<C> {
    async fn create(&self, input: CreateCheckoutSession) -> TripmateResult<CheckoutSession> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('checkout_session', $id) SET \
                 user_id = $user_id, \
                 tier = $tier, \
                 provider_session_id = $provider_session_id, \
                 checkout_url = $checkout_url, \
                 amount_cents = $amount_cents, \
                 currency = $currency, \
                 status = 'PENDING', \
                 premium_until = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("tier", input.tier.as_str().to_string()))
            .bind(("provider_session_id", input.provider_session_id))
            .bind(("checkout_url", input.checkout_url))
            .bind(("amount_cents", input.amount_cents))
            .bind(("currency", input.currency))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write(ENTITY, e))?;

        let rows: Vec<CheckoutRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: id_str,
        })?;

        Ok(row.into_session(id)?)
    }

    async fn get_by_provider_session(
        &self,
        provider_session_id: &str,
    ) -> TripmateResult<CheckoutSession> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM checkout_session \
                 WHERE provider_session_id = $provider_session_id LIMIT 1",
            )
            .bind(("provider_session_id", provider_session_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CheckoutRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: provider_session_id.to_string(),
        })?;

        Ok(row.try_into_session()?)
    }

    async fn mark_paid(
        &self,
        id: Uuid,
        premium_until: DateTime<Utc>,
    ) -> TripmateResult<CheckoutSession> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('checkout_session', $id) SET \
                 status = 'PAID', \
                 premium_until = $premium_until, \
                 updated_at = time::now() \
                 WHERE status = 'PENDING'",
            )
            .bind(("id", id_str.clone()))
            .bind(("premium_until", premium_until))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write(ENTITY, e))?;

        let rows: Vec<CheckoutRow> = result.take(0).map_err(DbError::from)?;
        if let Some(row) = rows.into_iter().next() {
            info!(checkout_id = %id, %premium_until, "Checkout marked paid");
            return Ok(row.into_session(id)?);
        }

        let mut lookup = self
            .db
            .query("SELECT status FROM type::record('checkout_session', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let current: Vec<StatusRow> = lookup.take(0).map_err(DbError::from)?;
        let err = match current.into_iter().next() {
            Some(row) => DbError::StaleState {
                entity: ENTITY.into(),
                id: id_str,
                expected: "PENDING".into(),
                found: row.status,
            },
            None => DbError::NotFound {
                entity: ENTITY.into(),
                id: id_str,
            },
        };
        Err(err.into())
    }

    async fn premium_until(&self, user_id: Uuid) -> TripmateResult<Option<DateTime<Utc>>> {
        let mut result = self
            .db
            .query(
                "SELECT premium_until FROM checkout_session \
                 WHERE user_id = $user_id AND status = 'PAID' \
                 ORDER BY premium_until DESC LIMIT 1",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PremiumRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().and_then(|r| r.premium_until))
    }
}
