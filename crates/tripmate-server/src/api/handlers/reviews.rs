//! Review handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tripmate_core::error::TripmateError;
use tripmate_core::models::review::{CreateReview, Rating, Review, ReviewSummary, UpdateReview};
use uuid::Uuid;

use crate::api::auth::AuthActor;
use crate::api::error::ApiError;
use crate::state::AppState;

/// A rating as clients send it: a JSON integer or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RatingInput {
    Int(i64),
    Text(String),
}

impl TryFrom<RatingInput> for Rating {
    type Error = TripmateError;

    fn try_from(input: RatingInput) -> Result<Self, Self::Error> {
        match input {
            RatingInput::Int(value) => Rating::try_from(value),
            RatingInput::Text(text) => text.parse(),
        }
    }
}

/// Body of POST /api/v1/reviews
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub reviewee_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub rating: RatingInput,
    #[serde(default)]
    pub comment: String,
}

/// Body of PATCH /api/v1/reviews/{id}
#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: Option<RatingInput>,
    pub comment: Option<String>,
}

/// POST /api/v1/reviews
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
    body: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let Json(body) = body?;
    let input = CreateReview {
        reviewee_id: body.reviewee_id,
        plan_id: body.plan_id,
        rating: Rating::try_from(body.rating)?,
        comment: body.comment,
    };
    let review = state.reviews.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// PATCH /api/v1/reviews/{id}
pub async fn update_review(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateReviewRequest>, JsonRejection>,
) -> Result<Json<Review>, ApiError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let patch = UpdateReview {
        rating: body.rating.map(Rating::try_from).transpose()?,
        comment: body.comment,
    };
    Ok(Json(state.reviews.update(&actor, id, patch).await?))
}

/// DELETE /api/v1/reviews/{id}
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    AuthActor(actor): AuthActor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.reviews.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reviews a user has received, with their average rating
///
/// GET /api/v1/users/{id}/reviews
pub async fn list_user_reviews(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ReviewSummary>, ApiError> {
    let Path(user_id) = id?;
    Ok(Json(state.reviews.list_for_user(user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_accept_integers_and_numeric_strings() {
        let body: CreateReviewRequest = serde_json::from_str(&format!(
            r#"{{"reviewee_id":"{}","rating":"4"}}"#,
            Uuid::new_v4()
        ))
        .unwrap();
        assert_eq!(Rating::try_from(body.rating).unwrap().value(), 4);

        let rating: RatingInput = serde_json::from_str("5").unwrap();
        assert_eq!(Rating::try_from(rating).unwrap().value(), 5);
    }

    #[test]
    fn out_of_range_or_fractional_ratings_fail() {
        for raw in ["0", "6", r#""4.5""#, r#""great""#] {
            let rating: RatingInput = serde_json::from_str(raw).unwrap();
            assert!(Rating::try_from(rating).is_err(), "{raw} accepted");
        }
        assert!(serde_json::from_str::<RatingInput>("4.5").is_err());
    }
}
