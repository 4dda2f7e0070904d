//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Status changes are expressed as
//! conditional writes: the implementation must apply the new status only
//! if the stored status still equals the expected one, and report
//! `InvalidState` otherwise.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::TripmateResult;
use crate::models::{
    checkout::{CheckoutSession, CreateCheckoutSession},
    join_request::{CreateJoinRequest, JoinRequest, JoinRequestStatus},
    review::{CreateReview, Review, UpdateReview},
    travel_plan::{CreateTravelPlan, PlanFilter, PlanStatus, TravelPlan, UpdateTravelPlan},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Travel plans
// ---------------------------------------------------------------------------

pub trait TravelPlanRepository: Send + Sync {
    fn create(
        &self,
        owner_id: Uuid,
        input: CreateTravelPlan,
    ) -> impl Future<Output = TripmateResult<TravelPlan>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TripmateResult<TravelPlan>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTravelPlan,
    ) -> impl Future<Output = TripmateResult<TravelPlan>> + Send;

    /// Compare-and-set on the plan status.
    fn transition_status(
        &self,
        id: Uuid,
        expected: PlanStatus,
        next: PlanStatus,
    ) -> impl Future<Output = TripmateResult<TravelPlan>> + Send;

    /// Append an image URL, refusing once the plan holds the maximum.
    fn append_image(
        &self,
        id: Uuid,
        url: String,
    ) -> impl Future<Output = TripmateResult<TravelPlan>> + Send;

    /// Delete the plan together with every join request that references
    /// it. Returns the number of join requests removed.
    fn delete_with_requests(&self, id: Uuid) -> impl Future<Output = TripmateResult<u64>> + Send;

    fn search(
        &self,
        filter: PlanFilter,
        pagination: Pagination,
    ) -> impl Future<Output = TripmateResult<PaginatedResult<TravelPlan>>> + Send;
    fn list_by_owner(
        &self,
        owner_id: Uuid,
    ) -> impl Future<Output = TripmateResult<Vec<TravelPlan>>> + Send;
    fn count_active_by_owner(
        &self,
        owner_id: Uuid,
    ) -> impl Future<Output = TripmateResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Join requests
// ---------------------------------------------------------------------------

pub trait JoinRequestRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the requester already holds a
    /// pending or approved request for the plan.
    fn create(
        &self,
        requester_id: Uuid,
        input: CreateJoinRequest,
    ) -> impl Future<Output = TripmateResult<JoinRequest>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TripmateResult<JoinRequest>> + Send;

    /// The requester's pending or approved request for the plan, if any.
    fn find_live(
        &self,
        requester_id: Uuid,
        plan_id: Uuid,
    ) -> impl Future<Output = TripmateResult<Option<JoinRequest>>> + Send;

    /// Compare-and-set on the request status. At most one of several
    /// racing callers observes success.
    fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: JoinRequestStatus,
        next: JoinRequestStatus,
    ) -> impl Future<Output = TripmateResult<JoinRequest>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = TripmateResult<()>> + Send;

    fn list_by_plan(
        &self,
        plan_id: Uuid,
    ) -> impl Future<Output = TripmateResult<Vec<JoinRequest>>> + Send;
    fn list_by_requester(
        &self,
        requester_id: Uuid,
    ) -> impl Future<Output = TripmateResult<Vec<JoinRequest>>> + Send;
    /// Requests addressed to any plan owned by `owner_id`.
    fn list_by_plan_owner(
        &self,
        owner_id: Uuid,
    ) -> impl Future<Output = TripmateResult<Vec<JoinRequest>>> + Send;
    fn list_all(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = TripmateResult<PaginatedResult<JoinRequest>>> + Send;

    fn approved_requesters(
        &self,
        plan_id: Uuid,
    ) -> impl Future<Output = TripmateResult<Vec<Uuid>>> + Send;
    fn approved_plan_ids(
        &self,
        requester_id: Uuid,
    ) -> impl Future<Output = TripmateResult<Vec<Uuid>>> + Send;
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

pub trait ReviewRepository: Send + Sync {
    /// Fails with `AlreadyExists` for a second review of the same
    /// (reviewer, reviewee, plan).
    fn create(
        &self,
        reviewer_id: Uuid,
        input: CreateReview,
    ) -> impl Future<Output = TripmateResult<Review>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TripmateResult<Review>> + Send;
    fn find_existing(
        &self,
        reviewer_id: Uuid,
        reviewee_id: Uuid,
        plan_id: Option<Uuid>,
    ) -> impl Future<Output = TripmateResult<Option<Review>>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateReview,
    ) -> impl Future<Output = TripmateResult<Review>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = TripmateResult<()>> + Send;
    fn list_for_reviewee(
        &self,
        reviewee_id: Uuid,
    ) -> impl Future<Output = TripmateResult<Vec<Review>>> + Send;
}

// ---------------------------------------------------------------------------
// Premium checkouts
// ---------------------------------------------------------------------------

pub trait CheckoutRepository: Send + Sync {
    fn create(
        &self,
        input: CreateCheckoutSession,
    ) -> impl Future<Output = TripmateResult<CheckoutSession>> + Send;
    fn get_by_provider_session(
        &self,
        provider_session_id: &str,
    ) -> impl Future<Output = TripmateResult<CheckoutSession>> + Send;

    /// Pending → paid, conditional on the checkout still being pending.
    fn mark_paid(
        &self,
        id: Uuid,
        premium_until: DateTime<Utc>,
    ) -> impl Future<Output = TripmateResult<CheckoutSession>> + Send;

    /// Latest `premium_until` across the user's paid checkouts.
    fn premium_until(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = TripmateResult<Option<DateTime<Utc>>>> + Send;
}
