//! Notification delivery through the structured log.
//!
//! Deployments forward the `notification` target to their mail relay.

use tracing::info;
use tripmate_core::collaborator::{Notification, Notifier};
use tripmate_core::error::{TripmateError, TripmateResult};

#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) -> TripmateResult<()> {
        let data = serde_json::to_string(&notification.data)
            .map_err(|e| TripmateError::NotificationDelivery(e.to_string()))?;
        info!(
            target: "tripmate::notification",
            recipient_id = %notification.recipient_id,
            template = ?notification.template,
            %data,
            "Notification queued"
        );
        Ok(())
    }
}
