//! Travel plan operations and status coordination.
//!
//! Completion is always an explicit owner action: nothing here derives
//! a plan's status from its dates or its requests.

use chrono::Utc;
use tracing::info;
use tripmate_core::collaborator::AssetStore;
use tripmate_core::error::{TripmateError, TripmateResult};
use tripmate_core::models::travel_plan::{
    CreateTravelPlan, MAX_PLAN_IMAGES, PlanFilter, PlanStatus, TravelPlan, UpdateTravelPlan,
};
use tripmate_core::models::user::Actor;
use tripmate_core::policy::{is_admin, is_owner, require};
use tripmate_core::repository::{
    CheckoutRepository, PaginatedResult, Pagination, TravelPlanRepository,
};
use uuid::Uuid;

use crate::payment::premium_active;

/// Limits applied to plan owners.
#[derive(Debug, Clone)]
pub struct PlanConfig {
    /// ACTIVE plans a user without premium may hold at once (default: 3).
    pub free_active_plan_limit: u64,
    /// Largest accepted image upload in bytes (default: 5 MiB).
    pub max_image_bytes: usize,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            free_active_plan_limit: 3,
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}

pub struct TravelPlanService<P, C, A>
where
    P: TravelPlanRepository,
    C: CheckoutRepository,
    A: AssetStore,
{
    plans: P,
    checkouts: C,
    assets: A,
    config: PlanConfig,
}

impl<P, C, A> TravelPlanService<P, C, A>
where
    P: TravelPlanRepository,
    C: CheckoutRepository,
    A: AssetStore,
{
    pub fn new(plans: P, checkouts: C, assets: A, config: PlanConfig) -> Self {
        Self {
            plans,
            checkouts,
            assets,
            config,
        }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        mut input: CreateTravelPlan,
    ) -> TripmateResult<TravelPlan> {
        input.validate()?;

        let active = self.plans.count_active_by_owner(actor.user_id).await?;
        if active >= self.config.free_active_plan_limit
            && !premium_active(&self.checkouts, actor.user_id, Utc::now()).await?
        {
            return Err(TripmateError::denied(format!(
                "free accounts may hold at most {} active plans",
                self.config.free_active_plan_limit
            )));
        }

        let plan = self.plans.create(actor.user_id, input).await?;
        info!(plan_id = %plan.id, owner_id = %actor.user_id, "Travel plan created");
        Ok(plan)
    }

    /// Plans are publicly readable.
    pub async fn get(&self, plan_id: Uuid) -> TripmateResult<TravelPlan> {
        self.plans.get_by_id(plan_id).await
    }

    pub async fn update(
        &self,
        actor: &Actor,
        plan_id: Uuid,
        mut patch: UpdateTravelPlan,
    ) -> TripmateResult<TravelPlan> {
        let plan = self.plans.get_by_id(plan_id).await?;
        require(is_owner(actor, &plan), "only the plan owner may edit it")?;
        ensure_active(&plan)?;

        if patch.is_empty() {
            return Ok(plan);
        }
        patch.validate_against(&plan)?;
        self.plans.update(plan_id, patch).await
    }

    pub async fn search(
        &self,
        filter: PlanFilter,
        pagination: Pagination,
    ) -> TripmateResult<PaginatedResult<TravelPlan>> {
        if let Some(max_budget) = filter.max_budget
            && !(max_budget.is_finite() && max_budget > 0.0)
        {
            return Err(TripmateError::validation("max budget must be a positive number"));
        }
        if let (Some(from), Some(to)) = (filter.from, filter.to)
            && from > to
        {
            return Err(TripmateError::validation("search window starts after it ends"));
        }
        self.plans.search(filter, pagination).await
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> TripmateResult<Vec<TravelPlan>> {
        self.plans.list_by_owner(owner_id).await
    }

    /// Owner attests the trip happened. This is what opens reviews
    /// between its participants.
    pub async fn mark_completed(&self, actor: &Actor, plan_id: Uuid) -> TripmateResult<TravelPlan> {
        self.close(actor, plan_id, PlanStatus::Completed).await
    }

    pub async fn cancel(&self, actor: &Actor, plan_id: Uuid) -> TripmateResult<TravelPlan> {
        self.close(actor, plan_id, PlanStatus::Cancelled).await
    }

    /// Remove the plan and every join request that references it.
    pub async fn delete(&self, actor: &Actor, plan_id: Uuid) -> TripmateResult<()> {
        let plan = self.plans.get_by_id(plan_id).await?;
        require(
            is_owner(actor, &plan) || is_admin(actor),
            "only the plan owner or an admin may delete it",
        )?;

        let removed = self.plans.delete_with_requests(plan_id).await?;
        info!(
            %plan_id,
            actor_id = %actor.user_id,
            removed_requests = removed,
            "Travel plan removed"
        );
        Ok(())
    }

    /// Store an uploaded image and append its URL to the plan.
    pub async fn attach_image(
        &self,
        actor: &Actor,
        plan_id: Uuid,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> TripmateResult<TravelPlan> {
        let plan = self.plans.get_by_id(plan_id).await?;
        require(is_owner(actor, &plan), "only the plan owner may add images")?;
        ensure_active(&plan)?;

        if plan.images.len() >= MAX_PLAN_IMAGES {
            return Err(TripmateError::validation(format!(
                "a plan may carry at most {MAX_PLAN_IMAGES} images"
            )));
        }
        if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
            return Err(TripmateError::validation(format!(
                "unsupported content type: {content_type}"
            )));
        }
        if bytes.is_empty() {
            return Err(TripmateError::validation("image is empty"));
        }
        if bytes.len() > self.config.max_image_bytes {
            return Err(TripmateError::validation(format!(
                "image exceeds {} bytes",
                self.config.max_image_bytes
            )));
        }

        let url = self.assets.store(bytes, content_type).await?;
        let plan = self.plans.append_image(plan_id, url).await?;
        info!(%plan_id, images = plan.images.len(), "Image attached to travel plan");
        Ok(plan)
    }

    async fn close(
        &self,
        actor: &Actor,
        plan_id: Uuid,
        next: PlanStatus,
    ) -> TripmateResult<TravelPlan> {
        let plan = self.plans.get_by_id(plan_id).await?;
        require(
            is_owner(actor, &plan),
            "only the plan owner may change its status",
        )?;
        if !plan.status.can_transition_to(next) {
            return Err(TripmateError::invalid_state(format!(
                "plan {plan_id} is {} and cannot become {next}",
                plan.status
            )));
        }
        self.plans
            .transition_status(plan_id, PlanStatus::Active, next)
            .await
    }
}

fn ensure_active(plan: &TravelPlan) -> TripmateResult<()> {
    if plan.status == PlanStatus::Active {
        Ok(())
    } else {
        Err(TripmateError::invalid_state(format!(
            "plan {} is {}",
            plan.id, plan.status
        )))
    }
}
