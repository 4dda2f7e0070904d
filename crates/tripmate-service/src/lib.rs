//! Tripmate Service — the join request engine and the travel plan,
//! review and payment operations built around it.
//!
//! Every service is generic over the core repository and collaborator
//! traits, so this crate has no dependency on the database or on any
//! transport.

pub mod join_request;
pub mod notify;
pub mod payment;
pub mod review;
pub mod travel_plan;

pub use join_request::JoinRequestService;
pub use payment::{PaymentConfig, PaymentGate};
pub use review::ReviewService;
pub use travel_plan::{PlanConfig, TravelPlanService};
