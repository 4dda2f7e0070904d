//! Best-effort notification dispatch.

use serde_json::Value;
use tracing::{debug, warn};
use tripmate_core::collaborator::{Notification, NotificationTemplate, Notifier};
use uuid::Uuid;

/// Hand a notification to the collaborator. Delivery failures are
/// logged and swallowed; the operation that triggered them has already
/// been committed.
pub(crate) async fn dispatch<N: Notifier>(
    notifier: &N,
    recipient_id: Uuid,
    template: NotificationTemplate,
    data: Value,
) {
    let notification = Notification {
        recipient_id,
        template,
        data,
    };
    match notifier.notify(notification).await {
        Ok(()) => debug!(%recipient_id, ?template, "Notification sent"),
        Err(e) => warn!(%recipient_id, ?template, error = %e, "Notification delivery failed"),
    }
}
