//! Travel plan service tests against in-memory SurrealDB.

mod common;

use common::{
    Checkouts, FakePaymentProvider, MemoryAssetStore, Plans, RecordingNotifier, Requests, db,
    plan_input,
};
use tripmate_core::error::TripmateError;
use tripmate_core::models::checkout::PremiumTier;
use tripmate_core::models::join_request::CreateJoinRequest;
use tripmate_core::models::travel_plan::{PlanFilter, PlanStatus, UpdateTravelPlan};
use tripmate_core::models::user::Actor;
use tripmate_core::repository::Pagination;
use tripmate_service::{
    JoinRequestService, PaymentConfig, PaymentGate, PlanConfig, TravelPlanService,
};
use uuid::Uuid;

type PlanService = TravelPlanService<Plans, Checkouts, MemoryAssetStore>;

struct Fixture {
    plans: PlanService,
    requests: JoinRequestService<Plans, Requests, RecordingNotifier>,
    payments: PaymentGate<Checkouts, FakePaymentProvider>,
    provider: FakePaymentProvider,
    assets: MemoryAssetStore,
}

async fn fixture(config: PlanConfig) -> Fixture {
    let db = db().await;
    let assets = MemoryAssetStore::default();
    let provider = FakePaymentProvider::default();
    Fixture {
        plans: TravelPlanService::new(
            Plans::new(db.clone()),
            Checkouts::new(db.clone()),
            assets.clone(),
            config,
        ),
        requests: JoinRequestService::new(
            Plans::new(db.clone()),
            Requests::new(db.clone()),
            RecordingNotifier::default(),
        ),
        payments: PaymentGate::new(
            Checkouts::new(db),
            provider.clone(),
            PaymentConfig::default(),
        ),
        provider,
        assets,
    }
}

#[tokio::test]
async fn create_validates_input() {
    let fx = fixture(PlanConfig::default()).await;
    let owner = Actor::user(Uuid::new_v4());

    let mut bad = plan_input("Bergen");
    bad.budget = 0.0;
    let err = fx.plans.create(&owner, bad).await.unwrap_err();
    assert!(matches!(err, TripmateError::Validation { .. }));

    let mut bad = plan_input("  ");
    bad.budget = 100.0;
    let err = fx.plans.create(&owner, bad).await.unwrap_err();
    assert!(matches!(err, TripmateError::Validation { .. }));

    let plan = fx.plans.create(&owner, plan_input("Bergen")).await.unwrap();
    assert_eq!(plan.status, PlanStatus::Active);
    assert_eq!(fx.plans.get(plan.id).await.unwrap().owner_id, owner.user_id);
}

#[tokio::test]
async fn free_users_hit_the_active_plan_limit_premium_users_do_not() {
    let fx = fixture(PlanConfig {
        free_active_plan_limit: 1,
        ..Default::default()
    })
    .await;
    let owner = Actor::user(Uuid::new_v4());

    let first = fx.plans.create(&owner, plan_input("Riga")).await.unwrap();
    let err = fx
        .plans
        .create(&owner, plan_input("Tallinn"))
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));

    // Closing a plan frees its slot.
    fx.plans.cancel(&owner, first.id).await.unwrap();
    fx.plans.create(&owner, plan_input("Tallinn")).await.unwrap();

    let checkout = fx
        .payments
        .start_checkout(&owner, PremiumTier::Monthly)
        .await
        .unwrap();
    fx.provider.pay(&checkout.provider_session_id);
    fx.payments
        .confirm_checkout(&owner, &checkout.provider_session_id)
        .await
        .unwrap();

    fx.plans.create(&owner, plan_input("Vilnius")).await.unwrap();
}

#[tokio::test]
async fn only_owner_may_update_active_plan() {
    let fx = fixture(PlanConfig::default()).await;
    let owner = Actor::user(Uuid::new_v4());
    let plan = fx.plans.create(&owner, plan_input("Gdansk")).await.unwrap();

    let patch = UpdateTravelPlan {
        destination: Some("Sopot".into()),
        ..Default::default()
    };

    let err = fx
        .plans
        .update(&Actor::user(Uuid::new_v4()), plan.id, patch.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));

    let updated = fx.plans.update(&owner, plan.id, patch.clone()).await.unwrap();
    assert_eq!(updated.destination, "Sopot");

    let unchanged = fx
        .plans
        .update(&owner, plan.id, UpdateTravelPlan::default())
        .await
        .unwrap();
    assert_eq!(unchanged.destination, "Sopot");

    fx.plans.mark_completed(&owner, plan.id).await.unwrap();
    let err = fx.plans.update(&owner, plan.id, patch).await.unwrap_err();
    assert!(matches!(err, TripmateError::InvalidState { .. }));
}

#[tokio::test]
async fn status_moves_only_out_of_active() {
    let fx = fixture(PlanConfig::default()).await;
    let owner = Actor::user(Uuid::new_v4());

    let cancelled = fx.plans.create(&owner, plan_input("Bled")).await.unwrap();
    fx.plans.cancel(&owner, cancelled.id).await.unwrap();
    let err = fx
        .plans
        .mark_completed(&owner, cancelled.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::InvalidState { .. }));

    let done = fx.plans.create(&owner, plan_input("Piran")).await.unwrap();
    let err = fx
        .plans
        .mark_completed(&Actor::admin(Uuid::new_v4()), done.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));

    let completed = fx.plans.mark_completed(&owner, done.id).await.unwrap();
    assert_eq!(completed.status, PlanStatus::Completed);
    let err = fx.plans.cancel(&owner, done.id).await.unwrap_err();
    assert!(matches!(err, TripmateError::InvalidState { .. }));
}

#[tokio::test]
async fn delete_cascades_and_later_listing_is_not_found() {
    let fx = fixture(PlanConfig::default()).await;
    let owner = Actor::user(Uuid::new_v4());
    let plan = fx.plans.create(&owner, plan_input("Zadar")).await.unwrap();

    for _ in 0..3 {
        fx.requests
            .create(
                &Actor::user(Uuid::new_v4()),
                CreateJoinRequest {
                    plan_id: plan.id,
                    message: "room for one more?".into(),
                },
            )
            .await
            .unwrap();
    }
    assert_eq!(fx.requests.list_received(&owner).await.unwrap().len(), 3);

    let err = fx
        .plans
        .delete(&Actor::user(Uuid::new_v4()), plan.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));

    fx.plans.delete(&owner, plan.id).await.unwrap();

    assert!(fx.requests.list_received(&owner).await.unwrap().is_empty());
    let err = fx
        .requests
        .list_for_plan(&owner, plan.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::NotFound { .. }));
}

#[tokio::test]
async fn admin_may_delete_any_plan() {
    let fx = fixture(PlanConfig::default()).await;
    let owner = Actor::user(Uuid::new_v4());
    let plan = fx.plans.create(&owner, plan_input("Kotor")).await.unwrap();

    fx.plans
        .delete(&Actor::admin(Uuid::new_v4()), plan.id)
        .await
        .unwrap();
    assert!(matches!(
        fx.plans.get(plan.id).await.unwrap_err(),
        TripmateError::NotFound { .. }
    ));
}

#[tokio::test]
async fn attach_image_checks_type_size_and_count() {
    let fx = fixture(PlanConfig {
        max_image_bytes: 16,
        ..Default::default()
    })
    .await;
    let owner = Actor::user(Uuid::new_v4());
    let plan = fx.plans.create(&owner, plan_input("Sarajevo")).await.unwrap();

    let err = fx
        .plans
        .attach_image(&owner, plan.id, vec![1; 8], "application/pdf")
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::Validation { .. }));

    let err = fx
        .plans
        .attach_image(&owner, plan.id, vec![1; 17], "image/png")
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::Validation { .. }));

    let err = fx
        .plans
        .attach_image(&Actor::user(Uuid::new_v4()), plan.id, vec![1; 8], "image/png")
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));

    for _ in 0..5 {
        fx.plans
            .attach_image(&owner, plan.id, vec![1; 8], "image/jpeg")
            .await
            .unwrap();
    }
    let err = fx
        .plans
        .attach_image(&owner, plan.id, vec![1; 8], "image/jpeg")
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::Validation { .. }));

    let plan = fx.plans.get(plan.id).await.unwrap();
    assert_eq!(plan.images.len(), 5);
    assert_eq!(plan.images[0], "https://assets.test/1.img");
    assert_eq!(fx.assets.stored().len(), 5);
}

#[tokio::test]
async fn search_is_public_and_validated() {
    let fx = fixture(PlanConfig::default()).await;
    let owner = Actor::user(Uuid::new_v4());
    fx.plans.create(&owner, plan_input("Mostar")).await.unwrap();
    fx.plans.create(&owner, plan_input("Budva")).await.unwrap();

    let found = fx
        .plans
        .search(
            PlanFilter {
                destination: Some("MOST".into()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(found.total, 1);

    let err = fx
        .plans
        .search(
            PlanFilter {
                max_budget: Some(-1.0),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::Validation { .. }));

    assert_eq!(fx.plans.list_by_owner(owner.user_id).await.unwrap().len(), 2);
}
