//! Join request engine tests against in-memory SurrealDB.

mod common;

use common::{FailingNotifier, Plans, RecordingNotifier, Requests, db, plan_input};
use tripmate_core::collaborator::{NotificationTemplate, Notifier};
use tripmate_core::error::TripmateError;
use tripmate_core::models::join_request::{CreateJoinRequest, JoinRequestStatus};
use tripmate_core::models::travel_plan::{PlanStatus, TravelPlan};
use tripmate_core::models::user::Actor;
use tripmate_core::repository::{Pagination, TravelPlanRepository};
use tripmate_service::JoinRequestService;
use uuid::Uuid;

struct Fixture<N: Notifier> {
    plans: Plans,
    service: JoinRequestService<Plans, Requests, N>,
    owner: Actor,
    plan: TravelPlan,
}

async fn fixture_with<N: Notifier>(notifier: N) -> Fixture<N> {
    let db = db().await;
    let plans = Plans::new(db.clone());
    let owner = Actor::user(Uuid::new_v4());
    let mut input = plan_input("Split");
    input.validate().unwrap();
    let plan = plans.create(owner.user_id, input).await.unwrap();

    Fixture {
        service: JoinRequestService::new(plans.clone(), Requests::new(db), notifier),
        plans,
        owner,
        plan,
    }
}

fn ask(plan_id: Uuid, message: &str) -> CreateJoinRequest {
    CreateJoinRequest {
        plan_id,
        message: message.into(),
    }
}

#[tokio::test]
async fn create_is_pending_and_notifies_owner() {
    let notifier = RecordingNotifier::default();
    let fx = fixture_with(notifier.clone()).await;
    let requester = Actor::user(Uuid::new_v4());

    let request = fx
        .service
        .create(&requester, ask(fx.plan.id, "  Let's go!  "))
        .await
        .unwrap();
    assert_eq!(request.status, JoinRequestStatus::Pending);
    assert_eq!(request.message, "Let's go!");

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient_id, fx.owner.user_id);
    assert_eq!(sent[0].template, NotificationTemplate::JoinRequestReceived);
}

#[tokio::test]
async fn create_validates_message_and_plan() {
    let fx = fixture_with(RecordingNotifier::default()).await;
    let requester = Actor::user(Uuid::new_v4());

    let err = fx
        .service
        .create(&requester, ask(fx.plan.id, "   "))
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::Validation { .. }));

    let err = fx
        .service
        .create(&requester, ask(Uuid::new_v4(), "hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::Validation { .. }));
}

#[tokio::test]
async fn owner_cannot_join_own_plan() {
    let fx = fixture_with(RecordingNotifier::default()).await;
    let err = fx
        .service
        .create(&fx.owner, ask(fx.plan.id, "me"))
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn closed_plan_refuses_requests() {
    let fx = fixture_with(RecordingNotifier::default()).await;
    fx.plans
        .transition_status(fx.plan.id, PlanStatus::Active, PlanStatus::Cancelled)
        .await
        .unwrap();

    let err = fx
        .service
        .create(&Actor::user(Uuid::new_v4()), ask(fx.plan.id, "hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::InvalidState { .. }));
}

#[tokio::test]
async fn duplicate_while_pending_or_approved_conflicts() {
    let fx = fixture_with(RecordingNotifier::default()).await;
    let requester = Actor::user(Uuid::new_v4());

    let first = fx
        .service
        .create(&requester, ask(fx.plan.id, "one"))
        .await
        .unwrap();
    let err = fx
        .service
        .create(&requester, ask(fx.plan.id, "two"))
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AlreadyExists { .. }));

    fx.service
        .respond(&fx.owner, first.id, JoinRequestStatus::Approved)
        .await
        .unwrap();
    let err = fx
        .service
        .create(&requester, ask(fx.plan.id, "three"))
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AlreadyExists { .. }));
}

#[tokio::test]
async fn rejected_requester_may_ask_again() {
    let fx = fixture_with(RecordingNotifier::default()).await;
    let requester = Actor::user(Uuid::new_v4());

    let first = fx
        .service
        .create(&requester, ask(fx.plan.id, "one"))
        .await
        .unwrap();
    fx.service
        .respond(&fx.owner, first.id, JoinRequestStatus::Rejected)
        .await
        .unwrap();

    let second = fx
        .service
        .create(&requester, ask(fx.plan.id, "please reconsider"))
        .await
        .unwrap();
    assert_eq!(second.status, JoinRequestStatus::Pending);
}

#[tokio::test]
async fn terminal_states_are_final() {
    let notifier = RecordingNotifier::default();
    let fx = fixture_with(notifier.clone()).await;
    let request = fx
        .service
        .create(&Actor::user(Uuid::new_v4()), ask(fx.plan.id, "hi"))
        .await
        .unwrap();

    let approved = fx
        .service
        .respond(&fx.owner, request.id, JoinRequestStatus::Approved)
        .await
        .unwrap();
    assert_eq!(approved.status, JoinRequestStatus::Approved);

    let err = fx
        .service
        .respond(&fx.owner, request.id, JoinRequestStatus::Rejected)
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::InvalidState { .. }));

    let listed = fx.service.list_for_plan(&fx.owner, fx.plan.id).await.unwrap();
    assert_eq!(listed[0].status, JoinRequestStatus::Approved);

    let templates: Vec<_> = notifier.sent().iter().map(|n| n.template).collect();
    assert_eq!(
        templates,
        vec![
            NotificationTemplate::JoinRequestReceived,
            NotificationTemplate::JoinRequestApproved
        ]
    );
}

#[tokio::test]
async fn respond_to_pending_is_not_a_valid_response() {
    let fx = fixture_with(RecordingNotifier::default()).await;
    let request = fx
        .service
        .create(&Actor::user(Uuid::new_v4()), ask(fx.plan.id, "hi"))
        .await
        .unwrap();

    let err = fx
        .service
        .respond(&fx.owner, request.id, JoinRequestStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::Validation { .. }));
}

#[tokio::test]
async fn non_owner_respond_is_denied_in_any_state() {
    let fx = fixture_with(RecordingNotifier::default()).await;
    let requester = Actor::user(Uuid::new_v4());
    let stranger = Actor::user(Uuid::new_v4());
    let admin = Actor::admin(Uuid::new_v4());

    let request = fx
        .service
        .create(&requester, ask(fx.plan.id, "hi"))
        .await
        .unwrap();

    for actor in [&requester, &stranger, &admin] {
        let err = fx
            .service
            .respond(actor, request.id, JoinRequestStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));
    }

    fx.service
        .respond(&fx.owner, request.id, JoinRequestStatus::Rejected)
        .await
        .unwrap();
    let err = fx
        .service
        .respond(&stranger, request.id, JoinRequestStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn respond_to_missing_request_is_not_found() {
    let fx = fixture_with(RecordingNotifier::default()).await;
    let err = fx
        .service
        .respond(&fx.owner, Uuid::new_v4(), JoinRequestStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::NotFound { .. }));
}

#[tokio::test]
async fn concurrent_responses_have_one_winner() {
    let fx = fixture_with(RecordingNotifier::default()).await;
    let request = fx
        .service
        .create(&Actor::user(Uuid::new_v4()), ask(fx.plan.id, "hi"))
        .await
        .unwrap();

    let (approve, reject) = tokio::join!(
        fx.service
            .respond(&fx.owner, request.id, JoinRequestStatus::Approved),
        fx.service
            .respond(&fx.owner, request.id, JoinRequestStatus::Rejected),
    );

    let outcomes = [approve, reject];
    let winners: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "exactly one response may win");
    for loser in outcomes.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(loser, TripmateError::InvalidState { .. }), "{loser:?}");
    }

    let stored = fx.service.list_for_plan(&fx.owner, fx.plan.id).await.unwrap();
    assert_eq!(stored[0].status, winners[0].status);
}

#[tokio::test]
async fn failing_notifier_never_aborts() {
    let fx = fixture_with(FailingNotifier).await;
    let request = fx
        .service
        .create(&Actor::user(Uuid::new_v4()), ask(fx.plan.id, "hi"))
        .await
        .unwrap();

    let approved = fx
        .service
        .respond(&fx.owner, request.id, JoinRequestStatus::Approved)
        .await
        .unwrap();
    assert_eq!(approved.status, JoinRequestStatus::Approved);
}

#[tokio::test]
async fn delete_rules_by_actor() {
    let fx = fixture_with(RecordingNotifier::default()).await;
    let requester = Actor::user(Uuid::new_v4());
    let stranger = Actor::user(Uuid::new_v4());

    let pending = fx
        .service
        .create(&requester, ask(fx.plan.id, "hi"))
        .await
        .unwrap();

    // Owners reject instead of deleting.
    for actor in [&fx.owner, &stranger] {
        let err = fx.service.delete(actor, pending.id).await.unwrap_err();
        assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));
    }

    fx.service.delete(&requester, pending.id).await.unwrap();
    assert!(fx.service.list_mine(&requester).await.unwrap().is_empty());

    let again = fx
        .service
        .create(&requester, ask(fx.plan.id, "hi again"))
        .await
        .unwrap();
    fx.service
        .respond(&fx.owner, again.id, JoinRequestStatus::Approved)
        .await
        .unwrap();

    let err = fx.service.delete(&requester, again.id).await.unwrap_err();
    assert!(matches!(err, TripmateError::InvalidState { .. }));

    fx.service
        .delete(&Actor::admin(Uuid::new_v4()), again.id)
        .await
        .unwrap();
    assert!(fx.service.list_mine(&requester).await.unwrap().is_empty());
}

#[tokio::test]
async fn listings_are_scoped_and_ordered() {
    let fx = fixture_with(RecordingNotifier::default()).await;
    let alice = Actor::user(Uuid::new_v4());
    let bob = Actor::user(Uuid::new_v4());
    let admin = Actor::admin(Uuid::new_v4());

    let first = fx
        .service
        .create(&alice, ask(fx.plan.id, "first"))
        .await
        .unwrap();
    let second = fx
        .service
        .create(&bob, ask(fx.plan.id, "second"))
        .await
        .unwrap();

    let for_plan = fx.service.list_for_plan(&fx.owner, fx.plan.id).await.unwrap();
    assert_eq!(for_plan.len(), 2);
    assert!(for_plan[0].created_at >= for_plan[1].created_at);
    let ids: Vec<Uuid> = for_plan.iter().map(|r| r.id).collect();
    assert!(ids.contains(&first.id) && ids.contains(&second.id));

    assert_eq!(
        fx.service.list_for_plan(&admin, fx.plan.id).await.unwrap().len(),
        2
    );
    let err = fx
        .service
        .list_for_plan(&alice, fx.plan.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));

    assert_eq!(fx.service.list_mine(&alice).await.unwrap().len(), 1);
    assert_eq!(fx.service.list_received(&fx.owner).await.unwrap().len(), 2);
    assert!(fx.service.list_received(&alice).await.unwrap().is_empty());

    let err = fx
        .service
        .list_all(&alice, Pagination::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TripmateError::AuthorizationDenied { .. }));
    let all = fx.service.list_all(&admin, Pagination::default()).await.unwrap();
    assert_eq!(all.total, 2);
}
