//! Tripmate Core — domain models, error taxonomy, authorization
//! predicates, and the traits through which the service layer reaches
//! storage and external collaborators.

pub mod collaborator;
pub mod error;
pub mod models;
pub mod policy;
pub mod repository;

pub use error::{TripmateError, TripmateResult};
pub use models::user::{Actor, Role};
