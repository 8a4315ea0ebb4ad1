use crate::api::models::{MarkReadRequest, NotificationFeed};
use crate::api::{ApiClient, ApiRequest};
use crate::error::ClientResult;

const NOTIFICATIONS_PATH: &str = "/api/notifications/";

/// Notification feed
#[derive(Debug, Clone)]
pub struct NotificationService {
    client: ApiClient,
}

impl NotificationService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Latest `limit` notifications and the unread total
    pub async fn list(&self, limit: u32) -> ClientResult<NotificationFeed> {
        let request = ApiRequest::get(NOTIFICATIONS_PATH).query("limit", limit.to_string());
        self.client.fetch(request).await
    }

    pub async fn mark_all_read(&self) -> ClientResult<()> {
        let request = ApiRequest::post(NOTIFICATIONS_PATH).json(&MarkReadRequest { all: true })?;
        self.client.submit(request).await
    }
}

/// Display label for a notification type
pub fn notification_label(kind: &str) -> String {
    match kind {
        "event_created" => "Mission created".to_string(),
        "event_updated" => "Mission updated".to_string(),
        "event_deleted" => "Mission deleted".to_string(),
        "google_sync" => "Google Calendar sync".to_string(),
        "brightspace_import" => "Brightspace import".to_string(),
        "" => "Notification".to_string(),
        other => other.replace('_', " "),
    }
}
