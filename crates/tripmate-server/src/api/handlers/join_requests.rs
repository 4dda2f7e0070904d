//! Join request handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tripmate_core::models::join_request::{CreateJoinRequest, JoinRequest, JoinRequestStatus};
use tripmate_core::repository::PaginatedResult;
use uuid::Uuid;

use crate::api::auth::AuthActor;
use crate::api::error::ApiError;
use crate::api::handlers::plans::PageQuery;
use crate::state::AppState;

/// Body of POST /api/v1/join-requests/{id}/respond
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    /// APPROVED or REJECTED
    pub status: JoinRequestStatus,
}

/// Ask to join a plan
///
/// POST /api/v1/join-requests
pub async fn create_join_request(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
    body: Result<Json<CreateJoinRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<JoinRequest>), ApiError> {
    let Json(input) = body?;
    let request = state.join_requests.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Every join request, paginated (admin only)
///
/// GET /api/v1/join-requests
pub async fn list_all_join_requests(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<PaginatedResult<JoinRequest>>, ApiError> {
    let Query(page) = query?;
    Ok(Json(
        state
            .join_requests
            .list_all(&actor, page.into_pagination())
            .await?,
    ))
}

/// Requests the caller has sent
///
/// GET /api/v1/join-requests/mine
pub async fn list_my_join_requests(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
) -> Result<Json<Vec<JoinRequest>>, ApiError> {
    Ok(Json(state.join_requests.list_mine(&actor).await?))
}

/// Requests addressed to the caller's plans
///
/// GET /api/v1/join-requests/received
pub async fn list_received_join_requests(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
) -> Result<Json<Vec<JoinRequest>>, ApiError> {
    Ok(Json(state.join_requests.list_received(&actor).await?))
}

/// Approve or reject a pending request (plan owner only)
///
/// POST /api/v1/join-requests/{id}/respond
pub async fn respond_to_join_request(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<RespondRequest>, JsonRejection>,
) -> Result<Json<JoinRequest>, ApiError> {
    let Path(id) = id?;
    let Json(body) = body?;
    Ok(Json(
        state.join_requests.respond(&actor, id, body.status).await?,
    ))
}

/// DELETE /api/v1/join-requests/{id}
pub async fn delete_join_request(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.join_requests.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
