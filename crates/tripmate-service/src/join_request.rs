//! Join request engine.
//!
//! Owns the PENDING → APPROVED | REJECTED lifecycle. Authorization is
//! decided here from the explicit actor; the single-winner guarantee on
//! `respond` comes from the repository's compare-and-set.

use serde_json::json;
use tracing::info;
use tripmate_core::collaborator::{NotificationTemplate, Notifier};
use tripmate_core::error::{TripmateError, TripmateResult};
use tripmate_core::models::join_request::{
    CreateJoinRequest, JoinRequest, JoinRequestStatus, newest_first,
};
use tripmate_core::models::travel_plan::{PlanStatus, TravelPlan};
use tripmate_core::models::user::Actor;
use tripmate_core::policy::{is_admin, is_owner, is_self, require};
use tripmate_core::repository::{
    JoinRequestRepository, PaginatedResult, Pagination, TravelPlanRepository,
};
use uuid::Uuid;

use crate::notify::dispatch;

pub struct JoinRequestService<P: TravelPlanRepository, J: JoinRequestRepository, N: Notifier> {
    plans: P,
    requests: J,
    notifier: N,
}

impl<P, J, N> JoinRequestService<P, J, N>
where
    P: TravelPlanRepository,
    J: JoinRequestRepository,
    N: Notifier,
{
    pub fn new(plans: P, requests: J, notifier: N) -> Self {
        Self {
            plans,
            requests,
            notifier,
        }
    }

    /// Ask to join a plan. The plan owner is notified once the request
    /// is stored.
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateJoinRequest,
    ) -> TripmateResult<JoinRequest> {
        let message = input.message.trim().to_string();
        if message.is_empty() {
            return Err(TripmateError::validation("message must not be empty"));
        }

        let plan = match self.plans.get_by_id(input.plan_id).await {
            Ok(plan) => plan,
            Err(TripmateError::NotFound { .. }) => {
                return Err(TripmateError::validation(format!(
                    "plan {} does not exist",
                    input.plan_id
                )));
            }
            Err(e) => return Err(e),
        };

        require(!is_owner(actor, &plan), "cannot request to join your own plan")?;
        if plan.status != PlanStatus::Active {
            return Err(TripmateError::invalid_state(format!(
                "plan {} is {} and no longer accepts requests",
                plan.id, plan.status
            )));
        }

        if self
            .requests
            .find_live(actor.user_id, plan.id)
            .await?
            .is_some()
        {
            return Err(TripmateError::AlreadyExists {
                entity: "join_request".into(),
            });
        }

        // The unique live-slot index still catches a racing duplicate.
        let request = self
            .requests
            .create(
                actor.user_id,
                CreateJoinRequest {
                    plan_id: plan.id,
                    message,
                },
            )
            .await?;

        info!(
            request_id = %request.id,
            plan_id = %plan.id,
            requester_id = %actor.user_id,
            "Join request created"
        );

        dispatch(
            &self.notifier,
            plan.owner_id,
            NotificationTemplate::JoinRequestReceived,
            json!({
                "request_id": request.id,
                "plan_id": plan.id,
                "destination": plan.destination,
                "requester_id": request.requester_id,
                "message": request.message,
            }),
        )
        .await;

        Ok(request)
    }

    /// Approve or reject a pending request. Only the plan owner may
    /// respond, and only once.
    pub async fn respond(
        &self,
        actor: &Actor,
        request_id: Uuid,
        status: JoinRequestStatus,
    ) -> TripmateResult<JoinRequest> {
        if !status.is_terminal() {
            return Err(TripmateError::validation(
                "a response must be APPROVED or REJECTED",
            ));
        }

        let request = self.requests.get_by_id(request_id).await?;
        let plan = self.plans.get_by_id(request.plan_id).await?;
        require(is_owner(actor, &plan), "only the plan owner may respond")?;

        if request.status != JoinRequestStatus::Pending {
            return Err(TripmateError::invalid_state(format!(
                "join request {request_id} is already {}",
                request.status
            )));
        }

        let updated = self
            .requests
            .compare_and_set_status(request_id, JoinRequestStatus::Pending, status)
            .await?;

        let template = match updated.status {
            JoinRequestStatus::Approved => NotificationTemplate::JoinRequestApproved,
            _ => NotificationTemplate::JoinRequestRejected,
        };
        dispatch(
            &self.notifier,
            updated.requester_id,
            template,
            json!({
                "request_id": updated.id,
                "plan_id": plan.id,
                "destination": plan.destination,
                "status": updated.status,
            }),
        )
        .await;

        Ok(updated)
    }

    /// Requesters may withdraw their own pending request; admins may
    /// delete any request.
    pub async fn delete(&self, actor: &Actor, request_id: Uuid) -> TripmateResult<()> {
        let request = self.requests.get_by_id(request_id).await?;

        if !is_admin(actor) {
            require(
                is_self(actor, request.requester_id),
                "only the requester or an admin may delete a join request",
            )?;
            if request.status != JoinRequestStatus::Pending {
                return Err(TripmateError::invalid_state(format!(
                    "join request {request_id} is {} and can no longer be withdrawn",
                    request.status
                )));
            }
        }

        self.requests.delete(request_id).await?;
        info!(%request_id, actor_id = %actor.user_id, "Join request deleted");
        Ok(())
    }

    /// All requests for one plan, visible to its owner and to admins.
    pub async fn list_for_plan(
        &self,
        actor: &Actor,
        plan_id: Uuid,
    ) -> TripmateResult<Vec<JoinRequest>> {
        let plan = self.plans.get_by_id(plan_id).await?;
        require_owner_or_admin(actor, &plan)?;
        Ok(sorted(self.requests.list_by_plan(plan_id).await?))
    }

    /// Requests the caller has sent.
    pub async fn list_mine(&self, actor: &Actor) -> TripmateResult<Vec<JoinRequest>> {
        Ok(sorted(self.requests.list_by_requester(actor.user_id).await?))
    }

    /// Requests addressed to any plan the caller owns.
    pub async fn list_received(&self, actor: &Actor) -> TripmateResult<Vec<JoinRequest>> {
        Ok(sorted(self.requests.list_by_plan_owner(actor.user_id).await?))
    }

    pub async fn list_all(
        &self,
        actor: &Actor,
        pagination: Pagination,
    ) -> TripmateResult<PaginatedResult<JoinRequest>> {
        require(is_admin(actor), "only admins may list every join request")?;
        self.requests.list_all(pagination).await
    }
}

fn sorted(mut requests: Vec<JoinRequest>) -> Vec<JoinRequest> {
    requests.sort_by(newest_first);
    requests
}

fn require_owner_or_admin(actor: &Actor, plan: &TravelPlan) -> TripmateResult<()> {
    require(
        is_owner(actor, plan) || is_admin(actor),
        "only the plan owner or an admin may view its requests",
    )
}
