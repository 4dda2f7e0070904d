//! Review gate and payment gate tests against in-memory SurrealDB,
//! including the end-to-end trip scenario.

mod common;

use common::{
    Checkouts, FakePaymentProvider, MemoryAssetStore, Plans, RecordingNotifier, Requests,
    Reviews, db, plan_input,
};
use tripmate_core::error::TripmateError;
use tripmate_core::models::checkout::{CheckoutStatus, PremiumTier};
use tripmate_core::models::join_request::{CreateJoinRequest, JoinRequestStatus};
use tripmate_core::models::review::{CreateReview, Rating, UpdateReview};
use tripmate_core::models::travel_plan::{PlanStatus, TravelPlan};
use tripmate_core::models::user::Actor;
use tripmate_service::{
    JoinRequestService, PaymentConfig, PaymentGate, PlanConfig, ReviewService, TravelPlanService,
};
use uuid::Uuid;

struct Fixture {
    plans: TravelPlanService<Plans, Checkouts, MemoryAssetStore>,
    requests: JoinRequestService<Plans, Requests, RecordingNotifier>,
    reviews: ReviewService<Plans, Requests, Reviews>,
}

async fn fixture() -> Fixture {
    let db = db().await;
    Fixture {
        plans: TravelPlanService::new(
            Plans::new(db.clone()),
            Checkouts::new(db.clone()),
            MemoryAssetStore::default(),
            PlanConfig::default(),
        ),
        requests: JoinRequestService::new(
            Plans::new(db.clone()),
            Requests::new(db.clone()),
            RecordingNotifier::default(),
        ),
        reviews: ReviewService::new(
            Plans::new(db.clone()),
            Requests::new(db.clone()),
            Reviews::new(db),
        ),
    }
}

fn rating(v: i64) -> Rating {
    Rating::try_from(v).unwrap()
}

fn review_of(reviewee: &Actor, plan_id: Option<Uuid>, stars: i64) -> CreateReview {
    CreateReview {
        reviewee_id: reviewee.user_id,
        plan_id,
        rating: rating(stars),
        comment: "Great travel companion".into(),
    }
}

/// Owner's plan with each member approved.
async fn trip(fx: &Fixture, owner: &Actor, members: &[&Actor]) -> TravelPlan {
    let plan = fx.plans.create(owner, plan_input("Madeira")).await.unwrap();
    for member in members {
        let request = fx
            .requests
            .create(
                member,
                CreateJoinRequest {
                    plan_id: plan.id,
                    message: "Let's go!".into(),
                },
            )
            .await
            .unwrap();
        fx.requests
            .respond(owner, request.id, JoinRequestStatus::Approved)
            .await
            .unwrap();
    }
    plan
}

#[tokio::test]
async fn full_trip_scenario() {
    let fx = fixture().await;
    let a = Actor::user(Uuid::new_v4());
    let b = Actor::user(Uuid::new_v4());
    let c = Actor::user(Uuid::new_v4());

    let plan = fx.plans.create(&a, plan_input("Azores")).await.unwrap();
    assert_eq!(plan.status, PlanStatus::Active);

    let r1 = fx
        .requests
        .create(
            &b,
            CreateJoinRequest {
                plan_id: plan.id,
                message: "Let's go!".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(r1.status, JoinRequestStatus::Pending);

    let r1 = fx
        .requests
        .respond(&a, r1.id, JoinRequestStatus::Approved)
        .await
        .unwrap();
    assert_eq!(r1.status, JoinRequestStatus::Approved);

    let plan = fx.plans.mark_completed(&a, plan.id).await.unwrap();
    assert_eq!(plan.status, PlanStatus::Completed);

    let review = fx
        .reviews
        .create(&b, review_of(&a, Some(plan.id), 5))
        .await
        .unwrap();
    assert_eq!(review.rating.value(), 5);

    let err = fx
        .reviews
        .create(&c, review_of(&a, Some(plan.id), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn reviews_wait_for_completion() {
    let fx = fixture().await;
    let owner = Actor::user(Uuid::new_v4());
    let member = Actor::user(Uuid::new_v4());
    let plan = trip(&fx, &owner, &[&member]).await;

    let err = fx
        .reviews
        .create(&member, review_of(&owner, Some(plan.id), 4))
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn every_participant_pairing_is_eligible_once() {
    let fx = fixture().await;
    let owner = Actor::user(Uuid::new_v4());
    let m1 = Actor::user(Uuid::new_v4());
    let m2 = Actor::user(Uuid::new_v4());
    let plan = trip(&fx, &owner, &[&m1, &m2]).await;
    fx.plans.mark_completed(&owner, plan.id).await.unwrap();

    fx.reviews
        .create(&owner, review_of(&m1, Some(plan.id), 4))
        .await
        .unwrap();
    fx.reviews
        .create(&m1, review_of(&owner, Some(plan.id), 5))
        .await
        .unwrap();
    fx.reviews
        .create(&m1, review_of(&m2, Some(plan.id), 3))
        .await
        .unwrap();

    let err = fx
        .reviews
        .create(&m1, review_of(&m2, Some(plan.id), 2))
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AlreadyExists { .. }));

    let err = fx
        .reviews
        .create(&m1, review_of(&m1, Some(plan.id), 5))
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::Validation { .. }));
}

#[tokio::test]
async fn rejected_requesters_are_not_participants() {
    let fx = fixture().await;
    let owner = Actor::user(Uuid::new_v4());
    let hopeful = Actor::user(Uuid::new_v4());
    let plan = fx.plans.create(&owner, plan_input("Faro")).await.unwrap();

    let request = fx
        .requests
        .create(
            &hopeful,
            CreateJoinRequest {
                plan_id: plan.id,
                message: "pick me".into(),
            },
        )
        .await
        .unwrap();
    fx.requests
        .respond(&owner, request.id, JoinRequestStatus::Rejected)
        .await
        .unwrap();
    fx.plans.mark_completed(&owner, plan.id).await.unwrap();

    let err = fx
        .reviews
        .create(&hopeful, review_of(&owner, Some(plan.id), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn planless_review_needs_a_shared_completed_trip() {
    let fx = fixture().await;
    let owner = Actor::user(Uuid::new_v4());
    let member = Actor::user(Uuid::new_v4());
    let plan = trip(&fx, &owner, &[&member]).await;

    let err = fx
        .reviews
        .create(&member, review_of(&owner, None, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));

    fx.plans.mark_completed(&owner, plan.id).await.unwrap();
    let review = fx
        .reviews
        .create(&member, review_of(&owner, None, 5))
        .await
        .unwrap();
    assert!(review.plan_id.is_none());

    let err = fx
        .reviews
        .create(&member, review_of(&owner, None, 4))
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AlreadyExists { .. }));

    // Owner side resolves through the plans they own.
    fx.reviews
        .create(&owner, review_of(&member, None, 4))
        .await
        .unwrap();
}

#[tokio::test]
async fn only_reviewer_edits_and_admin_may_delete() {
    let fx = fixture().await;
    let owner = Actor::user(Uuid::new_v4());
    let member = Actor::user(Uuid::new_v4());
    let plan = trip(&fx, &owner, &[&member]).await;
    fx.plans.mark_completed(&owner, plan.id).await.unwrap();

    let review = fx
        .reviews
        .create(&member, review_of(&owner, Some(plan.id), 2))
        .await
        .unwrap();

    let patch = UpdateReview {
        rating: Some(rating(4)),
        comment: Some("  Better on reflection ".into()),
    };
    let err = fx
        .reviews
        .update(&owner, review.id, patch.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));

    let updated = fx.reviews.update(&member, review.id, patch).await.unwrap();
    assert_eq!(updated.rating.value(), 4);
    assert_eq!(updated.comment, "Better on reflection");

    let summary = fx.reviews.list_for_user(owner.user_id).await.unwrap();
    assert_eq!(summary.count, 1);
    assert_eq!(summary.average_rating, Some(4.0));

    let err = fx.reviews.delete(&owner, review.id).await.unwrap_err();
    assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));
    fx.reviews
        .delete(&Actor::admin(Uuid::new_v4()), review.id)
        .await
        .unwrap();

    let summary = fx.reviews.list_for_user(owner.user_id).await.unwrap();
    assert_eq!(summary.count, 0);
    assert!(summary.average_rating.is_none());
}

#[tokio::test]
async fn checkout_confirmation_grants_premium_once() {
    let db = db().await;
    let provider = FakePaymentProvider::default();
    let gate = PaymentGate::new(Checkouts::new(db), provider.clone(), PaymentConfig::default());
    let buyer = Actor::user(Uuid::new_v4());

    assert!(!gate.is_premium(buyer.user_id).await.unwrap());

    let checkout = gate
        .start_checkout(&buyer, PremiumTier::Yearly)
        .await
        .unwrap();
    assert_eq!(checkout.status, CheckoutStatus::Pending);
    assert_eq!(checkout.amount_cents, 9999);
    assert!(checkout.checkout_url.is_some());

    let unpaid = gate
        .confirm_checkout(&buyer, &checkout.provider_session_id)
        .await
        .unwrap();
    assert_eq!(unpaid.status, CheckoutStatus::Pending);
    assert!(!gate.is_premium(buyer.user_id).await.unwrap());

    let err = gate
        .confirm_checkout(&Actor::user(Uuid::new_v4()), &checkout.provider_session_id)
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));

    provider.pay(&checkout.provider_session_id);
    let paid = gate
        .confirm_checkout(&buyer, &checkout.provider_session_id)
        .await
        .unwrap();
    assert_eq!(paid.status, CheckoutStatus::Paid);
    assert!(gate.is_premium(buyer.user_id).await.unwrap());

    let again = gate
        .confirm_checkout(&buyer, &checkout.provider_session_id)
        .await
        .unwrap();
    assert_eq!(again.premium_until, paid.premium_until);

    let err = gate.confirm_checkout(&buyer, "cs_unknown").await.unwrap_err();
    assert!(matches!(err, TripmateError::NotFound { .. }));
}
