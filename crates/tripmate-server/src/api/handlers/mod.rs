//! API request handlers

pub mod join_requests;
pub mod plans;
pub mod premium;
pub mod reviews;

use axum::Json;
use serde::Serialize;
use tripmate_core::models::user::{Actor, Role};
use uuid::Uuid;

use crate::api::auth::AuthActor;

/// The resolved identity of the caller.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub role: Role,
    pub verified: bool,
}

/// GET /api/v1/me
pub async fn me(AuthActor(actor): AuthActor) -> Json<MeResponse> {
    let Actor {
        user_id,
        role,
        verified,
    } = actor;
    Json(MeResponse {
        user_id,
        role,
        verified,
    })
}
