//! Concrete implementations of the core collaborator contracts.

pub mod assets;
pub mod notifier;
pub mod payment;

pub use assets::{AssetConfig, LocalAssetStore};
pub use notifier::LogNotifier;
pub use payment::{PaymentBackend, SandboxPaymentProvider, StripeConfig, StripePaymentProvider};
