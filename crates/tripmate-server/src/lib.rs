//! Tripmate Server — the HTTP boundary over the tripmate services.

pub mod api;
pub mod collaborators;
pub mod config;
pub mod state;

pub use api::create_router;
pub use config::{ConfigError, ServerConfig};
pub use state::AppState;
