//! Premium checkout handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripmate_core::models::checkout::{CheckoutSession, PremiumTier};
use uuid::Uuid;

use crate::api::auth::AuthActor;
use crate::api::error::ApiError;
use crate::state::AppState;

/// Body of POST /api/v1/premium/checkout
#[derive(Debug, Deserialize)]
pub struct StartCheckoutRequest {
    pub tier: PremiumTier,
}

/// Body of POST /api/v1/premium/confirm
#[derive(Debug, Deserialize)]
pub struct ConfirmCheckoutRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct PremiumStatusResponse {
    pub user_id: Uuid,
    pub premium: bool,
    pub premium_until: Option<DateTime<Utc>>,
}

/// POST /api/v1/premium/checkout
pub async fn start_checkout(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
    body: Result<Json<StartCheckoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CheckoutSession>), ApiError> {
    let Json(body) = body?;
    let session = state.payments.start_checkout(&actor, body.tier).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Verify a checkout with the provider and grant premium once paid
///
/// POST /api/v1/premium/confirm
pub async fn confirm_checkout(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
    body: Result<Json<ConfirmCheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutSession>, ApiError> {
    let Json(body) = body?;
    Ok(Json(
        state
            .payments
            .confirm_checkout(&actor, &body.session_id)
            .await?,
    ))
}

/// GET /api/v1/premium/status
pub async fn premium_status(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
) -> Result<Json<PremiumStatusResponse>, ApiError> {
    let premium_until = state.payments.premium_until(actor.user_id).await?;
    Ok(Json(PremiumStatusResponse {
        user_id: actor.user_id,
        premium: premium_until.is_some_and(|until| until > Utc::now()),
        premium_until,
    }))
}
