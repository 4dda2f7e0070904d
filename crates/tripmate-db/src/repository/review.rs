//! SurrealDB implementation of [`ReviewRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tripmate_core::error::TripmateResult;
use tripmate_core::models::review::{CreateReview, Rating, Review, UpdateReview};
use tripmate_core::repository::ReviewRepository;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

const ENTITY: &str = "review";
const NO_PLAN_KEY: &str = "none";

fn plan_key(plan_id: Option<Uuid>) -> String {
    plan_id.map_or_else(|| NO_PLAN_KEY.to_string(), |id| id.to_string())
}

#[derive(Debug, SurrealValue)]
struct ReviewRow {
    reviewer_id: String,
    reviewee_id: String,
    plan_id: Option<String>,
    rating: i64,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ReviewRowWithId {
    record_id: String,
    reviewer_id: String,
    reviewee_id: String,
    plan_id: Option<String>,
    rating: i64,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReviewRow {
    fn into_review(self, id: Uuid) -> Result<Review, DbError> {
        Ok(Review {
            id,
            reviewer_id: parse_uuid("reviewer", &self.reviewer_id)?,
            reviewee_id: parse_uuid("reviewee", &self.reviewee_id)?,
            plan_id: self
                .plan_id
                .as_deref()
                .map(|p| parse_uuid("plan", p))
                .transpose()?,
            rating: Rating::try_from(self.rating).map_err(|e| DbError::decode("rating", e))?,
            comment: self.comment,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ReviewRowWithId {
    fn try_into_review(self) -> Result<Review, DbError> {
        let id = parse_uuid("review", &self.record_id)?;
        ReviewRow {
            reviewer_id: self.reviewer_id,
            reviewee_id: self.reviewee_id,
            plan_id: self.plan_id,
            rating: self.rating,
            comment: self.comment,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_review(id)
    }
}

/// SurrealDB implementation of the Review repository.
#[derive(Clone)]
pub struct SurrealReviewRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealReviewRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ReviewRepository for SurrealReviewRepository<C> {
    async fn create(&self, reviewer_id: Uuid, input: CreateReview) -> TripmateResult<Review> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('review', $id) SET \
                 reviewer_id = $reviewer_id, \
                 reviewee_id = $reviewee_id, \
                 plan_id = $plan_id, \
                 plan_key = $plan_key, \
                 rating = $rating, \
                 comment = $comment",
            )
            .bind(("id", id_str.clone()))
            .bind(("reviewer_id", reviewer_id.to_string()))
            .bind(("reviewee_id", input.reviewee_id.to_string()))
            .bind(("plan_id", input.plan_id.map(|p| p.to_string())))
            .bind(("plan_key", plan_key(input.plan_id)))
            .bind(("rating", i64::from(input.rating.value())))
            .bind(("comment", input.comment))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write(ENTITY, e))?;

        let rows: Vec<ReviewRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: id_str,
        })?;

        Ok(row.into_review(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> TripmateResult<Review> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('review', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReviewRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: id_str,
        })?;

        Ok(row.into_review(id)?)
    }

    async fn find_existing(
        &self,
        reviewer_id: Uuid,
        reviewee_id: Uuid,
        plan_id: Option<Uuid>,
    ) -> TripmateResult<Option<Review>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM review \
                 WHERE reviewer_id = $reviewer_id \
                 AND reviewee_id = $reviewee_id \
                 AND plan_key = $plan_key",
            )
            .bind(("reviewer_id", reviewer_id.to_string()))
            .bind(("reviewee_id", reviewee_id.to_string()))
            .bind(("plan_key", plan_key(plan_id)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReviewRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_review()?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: Uuid, input: UpdateReview) -> TripmateResult<Review> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.rating.is_some() {
            sets.push("rating = $rating");
        }
        if input.comment.is_some() {
            sets.push("comment = $comment");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('review', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(rating) = input.rating {
            builder = builder.bind(("rating", i64::from(rating.value())));
        }
        if let Some(comment) = input.comment {
            builder = builder.bind(("comment", comment));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_write(ENTITY, e))?;

        let rows: Vec<ReviewRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: id_str,
        })?;

        Ok(row.into_review(id)?)
    }

    async fn delete(&self, id: Uuid) -> TripmateResult<()> {
        self.db
            .query("DELETE type::record('review', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_for_reviewee(&self, reviewee_id: Uuid) -> TripmateResult<Vec<Review>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM review \
                 WHERE reviewee_id = $reviewee_id \
                 ORDER BY created_at DESC",
            )
            .bind(("reviewee_id", reviewee_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReviewRowWithId> = result.take(0).map_err(DbError::from)?;
        let reviews = rows
            .into_iter()
            .map(|row| row.try_into_review())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reviews)
    }
}
