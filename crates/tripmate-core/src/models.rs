//! Domain models for tripmate.
//!
//! These are the core types shared across all crates.

pub mod checkout;
pub mod join_request;
pub mod review;
pub mod travel_plan;
pub mod user;
