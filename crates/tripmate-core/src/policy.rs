//! Authorization predicates.
//!
//! Pure functions over an actor and the resource it is acting on. The
//! services compose these instead of comparing ids and roles inline.

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::{TripmateError, TripmateResult};
use crate::models::travel_plan::{PlanStatus, TravelPlan};
use crate::models::user::{Actor, Role};

pub fn is_admin(actor: &Actor) -> bool {
    actor.role == Role::Admin
}

pub fn is_self(actor: &Actor, owner_id: Uuid) -> bool {
    actor.user_id == owner_id
}

pub fn is_owner(actor: &Actor, plan: &TravelPlan) -> bool {
    is_self(actor, plan.owner_id)
}

/// Fails with `AuthorizationDenied` unless `allowed` holds.
pub fn require(allowed: bool, reason: &str) -> TripmateResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(TripmateError::denied(reason))
    }
}

/// The people who travelled together on a completed plan: its owner plus
/// every requester the owner approved.
#[derive(Debug, Clone)]
pub struct TripParticipants {
    plan_id: Uuid,
    completed: bool,
    members: HashSet<Uuid>,
}

impl TripParticipants {
    pub fn new(plan: &TravelPlan, approved_requesters: impl IntoIterator<Item = Uuid>) -> Self {
        let mut members: HashSet<Uuid> = approved_requesters.into_iter().collect();
        members.insert(plan.owner_id);
        Self {
            plan_id: plan.id,
            completed: plan.status == PlanStatus::Completed,
            members,
        }
    }

    pub fn plan_id(&self) -> Uuid {
        self.plan_id
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        self.members.contains(&user_id)
    }

    /// Owner-reviews-member, member-reviews-owner and
    /// member-reviews-member all reduce to both parties being members of
    /// a completed trip.
    pub fn may_review(&self, reviewer: Uuid, reviewee: Uuid) -> bool {
        self.completed && reviewer != reviewee && self.contains(reviewer) && self.contains(reviewee)
    }
}
