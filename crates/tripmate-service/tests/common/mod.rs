//! Shared fixtures for service integration tests: an in-memory database
//! and collaborator doubles.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tripmate_core::collaborator::{
    AssetStore, CheckoutRequest, Notification, Notifier, PaymentProvider, PaymentStatus,
    ProviderSession,
};
use tripmate_core::error::{TripmateError, TripmateResult};
use tripmate_core::models::travel_plan::{CreateTravelPlan, TravelType};
use tripmate_db::repository::{
    SurrealCheckoutRepository, SurrealJoinRequestRepository, SurrealReviewRepository,
    SurrealTravelPlanRepository,
};
use uuid::Uuid;

pub type Plans = SurrealTravelPlanRepository<Db>;
pub type Requests = SurrealJoinRequestRepository<Db>;
pub type Reviews = SurrealReviewRepository<Db>;
pub type Checkouts = SurrealCheckoutRepository<Db>;

pub async fn db() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tripmate_db::run_migrations(&db).await.unwrap();
    db
}

pub fn plan_input(destination: &str) -> CreateTravelPlan {
    CreateTravelPlan {
        destination: destination.into(),
        start_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 9, 9).unwrap(),
        budget: 1500.0,
        travel_type: TravelType::Friends,
        description: "A week on the coast".into(),
        interests: vec!["beach".into()],
        images: vec![],
    }
}

/// Keeps every notification it is handed.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> TripmateResult<()> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Fails every delivery.
#[derive(Clone, Default)]
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    async fn notify(&self, _notification: Notification) -> TripmateResult<()> {
        Err(TripmateError::NotificationDelivery("smtp unreachable".into()))
    }
}

/// Hands out sequential fake URLs.
#[derive(Clone, Default)]
pub struct MemoryAssetStore {
    stored: Arc<Mutex<Vec<(usize, String)>>>,
}

impl MemoryAssetStore {
    pub fn stored(&self) -> Vec<(usize, String)> {
        self.stored.lock().unwrap().clone()
    }
}

impl AssetStore for MemoryAssetStore {
    async fn store(&self, bytes: Vec<u8>, content_type: &str) -> TripmateResult<String> {
        let mut stored = self.stored.lock().unwrap();
        stored.push((bytes.len(), content_type.to_string()));
        Ok(format!("https://assets.test/{}.img", stored.len()))
    }
}

/// A provider whose sessions are paid once the test says so.
#[derive(Clone, Default)]
pub struct FakePaymentProvider {
    paid: Arc<Mutex<Vec<String>>>,
}

impl FakePaymentProvider {
    pub fn pay(&self, session_id: &str) {
        self.paid.lock().unwrap().push(session_id.to_string());
    }
}

impl PaymentProvider for FakePaymentProvider {
    async fn create_session(&self, request: CheckoutRequest) -> TripmateResult<ProviderSession> {
        let session_id = format!("cs_{}", Uuid::new_v4().simple());
        Ok(ProviderSession {
            checkout_url: Some(format!(
                "https://pay.test/{session_id}?amount={}",
                request.amount_cents
            )),
            session_id,
        })
    }

    async fn verify_session(&self, session_id: &str) -> TripmateResult<PaymentStatus> {
        Ok(PaymentStatus {
            paid: self.paid.lock().unwrap().iter().any(|s| s == session_id),
        })
    }
}
