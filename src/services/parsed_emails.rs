use crate::api::models::{CreatedFromEmail, Event, ParseEmailRequest, ParsedEmail};
use crate::api::{ApiClient, ApiRequest};
use crate::error::{ClientResult, Error};
use tracing::info;

const PARSED_EMAILS_PATH: &str = "/api/parsed-emails/";
const PARSE_EMAIL_PATH: &str = "/api/events/parse-email/";

/// Event suggestions extracted from email
#[derive(Debug, Clone)]
pub struct ParsedEmailService {
    client: ApiClient,
}

impl ParsedEmailService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Suggestions waiting for review
    pub async fn pending(&self) -> ClientResult<Vec<ParsedEmail>> {
        let request = ApiRequest::get(PARSED_EMAILS_PATH).query("status", "pending");
        self.client.fetch(request).await
    }

    /// Accept a suggestion; the server creates the event
    pub async fn approve(&self, id: i64) -> ClientResult<Event> {
        let created: CreatedFromEmail = self
            .client
            .fetch(ApiRequest::post(format!("{}{}/approve/", PARSED_EMAILS_PATH, id)))
            .await?;
        info!("Suggestion {} approved as event {}", id, created.event.id);
        Ok(created.event)
    }

    pub async fn reject(&self, id: i64) -> ClientResult<()> {
        self.client
            .submit(ApiRequest::post(format!("{}{}/reject/", PARSED_EMAILS_PATH, id)))
            .await?;
        info!("Suggestion {} rejected", id);
        Ok(())
    }

    /// Turn pasted email text into an event
    pub async fn parse(&self, email_text: &str) -> ClientResult<Event> {
        let email_text = email_text.trim();
        if email_text.is_empty() {
            return Err(Error::Validation("Please paste an email first.".to_string()));
        }
        let request = ApiRequest::post(PARSE_EMAIL_PATH).json(&ParseEmailRequest {
            email_text: email_text.to_string(),
        })?;
        let created: CreatedFromEmail = self.client.fetch(request).await?;
        Ok(created.event)
    }
}
