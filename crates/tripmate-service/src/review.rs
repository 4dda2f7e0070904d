//! Review gate.
//!
//! A review is only accepted between two participants of a completed
//! trip. Participation is resolved once into a [`TripParticipants`] set
//! and checked with a single predicate.

use std::collections::BTreeSet;

use tracing::info;
use tripmate_core::error::{TripmateError, TripmateResult};
use tripmate_core::models::review::{CreateReview, Review, ReviewSummary, UpdateReview};
use tripmate_core::models::travel_plan::{PlanStatus, TravelPlan};
use tripmate_core::models::user::Actor;
use tripmate_core::policy::{TripParticipants, is_admin, is_self, require};
use tripmate_core::repository::{JoinRequestRepository, ReviewRepository, TravelPlanRepository};
use uuid::Uuid;

pub struct ReviewService<P, J, R>
where
    P: TravelPlanRepository,
    J: JoinRequestRepository,
    R: ReviewRepository,
{
    plans: P,
    requests: J,
    reviews: R,
}

impl<P, J, R> ReviewService<P, J, R>
where
    P: TravelPlanRepository,
    J: JoinRequestRepository,
    R: ReviewRepository,
{
    pub fn new(plans: P, requests: J, reviews: R) -> Self {
        Self {
            plans,
            requests,
            reviews,
        }
    }

    pub async fn create(&self, actor: &Actor, mut input: CreateReview) -> TripmateResult<Review> {
        if input.reviewee_id == actor.user_id {
            return Err(TripmateError::validation("you cannot review yourself"));
        }
        input.comment = input.comment.trim().to_string();

        let eligible = match input.plan_id {
            Some(plan_id) => {
                let plan = self.plans.get_by_id(plan_id).await?;
                self.participants(&plan)
                    .await?
                    .may_review(actor.user_id, input.reviewee_id)
            }
            None => self.shared_completed_trip(actor.user_id, input.reviewee_id).await?,
        };
        require(
            eligible,
            "reviews require a completed trip taken together",
        )?;

        if self
            .reviews
            .find_existing(actor.user_id, input.reviewee_id, input.plan_id)
            .await?
            .is_some()
        {
            return Err(TripmateError::AlreadyExists {
                entity: "review".into(),
            });
        }

        let review = self.reviews.create(actor.user_id, input).await?;
        info!(
            review_id = %review.id,
            reviewer_id = %review.reviewer_id,
            reviewee_id = %review.reviewee_id,
            rating = review.rating.value(),
            "Review created"
        );
        Ok(review)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        review_id: Uuid,
        mut patch: UpdateReview,
    ) -> TripmateResult<Review> {
        let review = self.reviews.get_by_id(review_id).await?;
        require(
            is_self(actor, review.reviewer_id),
            "only the reviewer may edit a review",
        )?;

        if let Some(comment) = patch.comment.as_mut() {
            *comment = comment.trim().to_string();
        }
        if patch.rating.is_none() && patch.comment.is_none() {
            return Ok(review);
        }
        self.reviews.update(review_id, patch).await
    }

    pub async fn delete(&self, actor: &Actor, review_id: Uuid) -> TripmateResult<()> {
        let review = self.reviews.get_by_id(review_id).await?;
        require(
            is_self(actor, review.reviewer_id) || is_admin(actor),
            "only the reviewer or an admin may delete a review",
        )?;
        self.reviews.delete(review_id).await?;
        info!(%review_id, actor_id = %actor.user_id, "Review deleted");
        Ok(())
    }

    /// Reviews a user has received, newest first, with their average.
    pub async fn list_for_user(&self, user_id: Uuid) -> TripmateResult<ReviewSummary> {
        let mut reviews = self.reviews.list_for_reviewee(user_id).await?;
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(ReviewSummary::from_reviews(user_id, reviews))
    }

    async fn participants(&self, plan: &TravelPlan) -> TripmateResult<TripParticipants> {
        let approved = self.requests.approved_requesters(plan.id).await?;
        Ok(TripParticipants::new(plan, approved))
    }

    /// Whether any completed plan counts both users among its
    /// participants. Only plans the reviewer owns or was approved for
    /// can qualify.
    async fn shared_completed_trip(&self, reviewer: Uuid, reviewee: Uuid) -> TripmateResult<bool> {
        let mut candidates: BTreeSet<Uuid> = self
            .plans
            .list_by_owner(reviewer)
            .await?
            .into_iter()
            .filter(|p| p.status == PlanStatus::Completed)
            .map(|p| p.id)
            .collect();
        candidates.extend(self.requests.approved_plan_ids(reviewer).await?);

        for plan_id in candidates {
            let plan = match self.plans.get_by_id(plan_id).await {
                Ok(plan) => plan,
                Err(TripmateError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            };
            if plan.status != PlanStatus::Completed {
                continue;
            }
            if self.participants(&plan).await?.may_review(reviewer, reviewee) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
