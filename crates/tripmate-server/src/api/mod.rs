//! HTTP API: routing, bearer authentication and error presentation.

pub mod auth;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

fn v1_routes(upload_limit: usize) -> Router<Arc<AppState>> {
    use handlers::{join_requests, me, plans, premium, reviews};

    Router::new()
        .route("/me", get(me))
        // Travel plans
        .route("/plans", post(plans::create_plan).get(plans::search_plans))
        .route(
            "/plans/{id}",
            get(plans::get_plan)
                .patch(plans::update_plan)
                .delete(plans::delete_plan),
        )
        .route("/plans/{id}/complete", post(plans::complete_plan))
        .route("/plans/{id}/cancel", post(plans::cancel_plan))
        .route(
            "/plans/{id}/images",
            post(plans::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/plans/{id}/requests", get(plans::list_plan_requests))
        // Join requests
        .route(
            "/join-requests",
            post(join_requests::create_join_request).get(join_requests::list_all_join_requests),
        )
        .route("/join-requests/mine", get(join_requests::list_my_join_requests))
        .route(
            "/join-requests/received",
            get(join_requests::list_received_join_requests),
        )
        .route(
            "/join-requests/{id}",
            delete(join_requests::delete_join_request),
        )
        .route(
            "/join-requests/{id}/respond",
            post(join_requests::respond_to_join_request),
        )
        // Reviews
        .route("/reviews", post(reviews::create_review))
        .route(
            "/reviews/{id}",
            patch(reviews::update_review).delete(reviews::delete_review),
        )
        // Users
        .route("/users/{id}/reviews", get(reviews::list_user_reviews))
        .route("/users/{id}/plans", get(plans::list_user_plans))
        // Premium
        .route("/premium/checkout", post(premium::start_checkout))
        .route("/premium/confirm", post(premium::confirm_checkout))
        .route("/premium/status", get(premium::premium_status))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", v1_routes(state.max_upload_bytes))
        .nest_service("/assets", ServeDir::new(&state.asset_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
