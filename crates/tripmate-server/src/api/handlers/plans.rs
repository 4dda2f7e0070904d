//! Travel plan handlers.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use chrono::NaiveDate;
use serde::Deserialize;
use tripmate_core::models::join_request::JoinRequest;
use tripmate_core::models::travel_plan::{
    CreateTravelPlan, PlanFilter, PlanStatus, TravelPlan, TravelType, UpdateTravelPlan,
};
use tripmate_core::repository::{PaginatedResult, Pagination};
use uuid::Uuid;

use crate::api::auth::AuthActor;
use crate::api::error::ApiError;
use crate::state::AppState;

/// Largest page a listing returns.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Offset/limit query parameters shared by paginated listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn into_pagination(self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            offset: self.offset.unwrap_or(defaults.offset),
            limit: self.limit.unwrap_or(defaults.limit).clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// Query parameters of GET /api/v1/plans
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub destination: Option<String>,
    pub travel_type: Option<TravelType>,
    pub interest: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub max_budget: Option<f64>,
    pub status: Option<PlanStatus>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl SearchQuery {
    fn split(self) -> (PlanFilter, Pagination) {
        let filter = PlanFilter {
            destination: self.destination.filter(|d| !d.trim().is_empty()),
            travel_type: self.travel_type,
            interest: self.interest.filter(|i| !i.trim().is_empty()),
            from: self.from,
            to: self.to,
            max_budget: self.max_budget,
            status: self.status,
        };
        let page = PageQuery {
            offset: self.offset,
            limit: self.limit,
        };
        (filter, page.into_pagination())
    }
}

/// Create a plan owned by the caller
///
/// POST /api/v1/plans
pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
    body: Result<Json<CreateTravelPlan>, JsonRejection>,
) -> Result<(StatusCode, Json<TravelPlan>), ApiError> {
    let Json(input) = body?;
    let plan = state.plans.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// Public search over plans. Defaults to ACTIVE plans.
///
/// GET /api/v1/plans
pub async fn search_plans(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<PaginatedResult<TravelPlan>>, ApiError> {
    let Query(query) = query?;
    let (filter, pagination) = query.split();
    Ok(Json(state.plans.search(filter, pagination).await?))
}

/// GET /api/v1/plans/{id}
pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TravelPlan>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.plans.get(id).await?))
}

/// PATCH /api/v1/plans/{id}
pub async fn update_plan(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateTravelPlan>, JsonRejection>,
) -> Result<Json<TravelPlan>, ApiError> {
    let Path(id) = id?;
    let Json(patch) = body?;
    Ok(Json(state.plans.update(&actor, id, patch).await?))
}

/// Delete a plan together with its join requests
///
/// DELETE /api/v1/plans/{id}
pub async fn delete_plan(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.plans.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/plans/{id}/complete
pub async fn complete_plan(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TravelPlan>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.plans.mark_completed(&actor, id).await?))
}

/// POST /api/v1/plans/{id}/cancel
pub async fn cancel_plan(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TravelPlan>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.plans.cancel(&actor, id).await?))
}

/// Upload one image as the raw request body
///
/// POST /api/v1/plans/{id}/images
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
    id: Result<Path<Uuid>, PathRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<TravelPlan>), ApiError> {
    let Path(id) = id?;
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let plan = state
        .plans
        .attach_image(&actor, id, body.to_vec(), content_type)
        .await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// Join requests addressed to one plan (owner or admin)
///
/// GET /api/v1/plans/{id}/requests
pub async fn list_plan_requests(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<JoinRequest>>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.join_requests.list_for_plan(&actor, id).await?))
}

/// GET /api/v1/users/{id}/plans
pub async fn list_user_plans(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<TravelPlan>>, ApiError> {
    let Path(owner_id) = id?;
    Ok(Json(state.plans.list_by_owner(owner_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_clamped() {
        let page = PageQuery {
            offset: Some(20),
            limit: Some(10_000),
        }
        .into_pagination();
        assert_eq!(page.offset, 20);
        assert_eq!(page.limit, MAX_PAGE_SIZE);

        let page = PageQuery {
            offset: None,
            limit: Some(0),
        }
        .into_pagination();
        assert_eq!(page.limit, 1);
    }

    #[test]
    fn blank_text_filters_are_dropped() {
        let (filter, page) = SearchQuery {
            destination: Some("  ".into()),
            interest: Some("surf".into()),
            ..Default::default()
        }
        .split();
        assert!(filter.destination.is_none());
        assert_eq!(filter.interest.as_deref(), Some("surf"));
        assert_eq!(page.limit, Pagination::default().limit);
    }
}
