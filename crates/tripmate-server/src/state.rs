//! Shared application state handed to every handler.

use std::path::PathBuf;

use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tripmate_auth::{AuthError, JwtIdentityResolver, TimedResolver};
use tripmate_db::repository::{
    SurrealCheckoutRepository, SurrealJoinRequestRepository, SurrealReviewRepository,
    SurrealTravelPlanRepository,
};
use tripmate_service::{JoinRequestService, PaymentGate, ReviewService, TravelPlanService};

use crate::collaborators::{
    LocalAssetStore, LogNotifier, PaymentBackend, SandboxPaymentProvider, StripePaymentProvider,
};
use crate::config::ServerConfig;

pub type Plans = SurrealTravelPlanRepository<Any>;
pub type Requests = SurrealJoinRequestRepository<Any>;
pub type Reviews = SurrealReviewRepository<Any>;
pub type Checkouts = SurrealCheckoutRepository<Any>;

pub type Resolver = TimedResolver<JwtIdentityResolver>;

pub struct AppState {
    pub resolver: Resolver,
    pub plans: TravelPlanService<Plans, Checkouts, LocalAssetStore>,
    pub join_requests: JoinRequestService<Plans, Requests, LogNotifier>,
    pub reviews: ReviewService<Plans, Requests, Reviews>,
    pub payments: PaymentGate<Checkouts, PaymentBackend>,
    /// Directory served under `/assets`.
    pub asset_dir: PathBuf,
    /// Request body limit for image uploads.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wire the services onto an already migrated database.
    pub fn new(db: Surreal<Any>, config: &ServerConfig) -> Result<Self, AuthError> {
        Self::with_payment_backend(db, config, payment_backend(config))
    }

    /// As [`AppState::new`], with an explicit payment provider.
    pub fn with_payment_backend(
        db: Surreal<Any>,
        config: &ServerConfig,
        backend: PaymentBackend,
    ) -> Result<Self, AuthError> {
        let resolver = TimedResolver::new(
            JwtIdentityResolver::new(&config.auth)?,
            config.auth.resolver_timeout(),
        );

        let plans = Plans::new(db.clone());
        let requests = Requests::new(db.clone());
        let reviews = Reviews::new(db.clone());
        let checkouts = Checkouts::new(db);

        Ok(Self {
            resolver,
            plans: TravelPlanService::new(
                plans.clone(),
                checkouts.clone(),
                LocalAssetStore::new(config.assets.clone()),
                config.plans.clone(),
            ),
            join_requests: JoinRequestService::new(plans.clone(), requests.clone(), LogNotifier),
            reviews: ReviewService::new(plans, requests, reviews),
            payments: PaymentGate::new(checkouts, backend, config.payment.clone()),
            asset_dir: config.assets.dir.clone(),
            max_upload_bytes: config.plans.max_image_bytes,
        })
    }
}

fn payment_backend(config: &ServerConfig) -> PaymentBackend {
    match &config.stripe {
        Some(stripe) => PaymentBackend::Stripe(StripePaymentProvider::new(stripe.clone())),
        None => PaymentBackend::Sandbox(SandboxPaymentProvider::new(true)),
    }
}
