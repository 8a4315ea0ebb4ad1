//! Typed wrappers over the backend endpoints

pub mod auth;
pub mod events;
pub mod integrations;
pub mod notifications;
pub mod parsed_emails;

pub use auth::AuthService;
pub use events::EventService;
pub use integrations::IntegrationService;
pub use notifications::{notification_label, NotificationService};
pub use parsed_emails::ParsedEmailService;

use crate::api::ApiClient;

/// Every service, sharing one client
#[derive(Debug, Clone)]
pub struct Services {
    pub auth: AuthService,
    pub events: EventService,
    pub integrations: IntegrationService,
    pub notifications: NotificationService,
    pub parsed_emails: ParsedEmailService,
}

impl Services {
    pub fn new(client: &ApiClient) -> Self {
        Self {
            auth: AuthService::new(client.clone()),
            events: EventService::new(client.clone()),
            integrations: IntegrationService::new(client.clone()),
            notifications: NotificationService::new(client.clone()),
            parsed_emails: ParsedEmailService::new(client.clone()),
        }
    }
}
