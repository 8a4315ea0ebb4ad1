use crate::api::models::{Event, EventPatch, NewEvent, Occurrence, ResponseStatus, RsvpRequest};
use crate::api::{ApiClient, ApiRequest};
use crate::error::{decode_error, ClientResult, Error};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info};

const EVENTS_PATH: &str = "/api/events/";
const OCCURRENCES_PATH: &str = "/api/events/occurrences/";

fn event_path(id: i64) -> String {
    format!("{}{}/", EVENTS_PATH, id)
}

/// Event CRUD and occurrence queries
#[derive(Debug, Clone)]
pub struct EventService {
    client: ApiClient,
}

impl EventService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ClientResult<Vec<Event>> {
        self.client.fetch(ApiRequest::get(EVENTS_PATH)).await
    }

    pub async fn get(&self, id: i64) -> ClientResult<Event> {
        self.client.fetch(ApiRequest::get(event_path(id))).await
    }

    pub async fn create(&self, event: &NewEvent) -> ClientResult<Event> {
        let created: Event = self
            .client
            .fetch(ApiRequest::post(EVENTS_PATH).json(event)?)
            .await?;
        info!("Created event {} ({})", created.id, created.title);
        Ok(created)
    }

    pub async fn update(&self, id: i64, patch: &EventPatch) -> ClientResult<Event> {
        if patch.is_empty() {
            return Err(Error::Validation("Nothing to update.".to_string()));
        }
        let updated: Event = self
            .client
            .fetch(ApiRequest::patch(event_path(id)).json(patch)?)
            .await?;
        info!("Updated event {}", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        self.client.submit(ApiRequest::delete(event_path(id))).await?;
        info!("Deleted event {}", id);
        Ok(())
    }

    /// Occurrences overlapping `[start, end]`, expanded by the server.
    ///
    /// An occurrence ending before it starts fails the whole response.
    pub async fn occurrences(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ClientResult<Vec<Occurrence>> {
        if end < start {
            return Err(Error::Validation(
                "End must be greater or equal to start.".to_string(),
            ));
        }

        let request = ApiRequest::get(OCCURRENCES_PATH)
            .query("start", start.to_rfc3339_opts(SecondsFormat::Millis, true))
            .query("end", end.to_rfc3339_opts(SecondsFormat::Millis, true));
        let occurrences: Vec<Occurrence> = self.client.fetch(request).await?;

        if let Some(bad) = occurrences.iter().find(|o| !o.is_well_formed()) {
            return Err(decode_error(&format!(
                "Occurrence {} ends before it starts",
                bad.occurrence_id
            )));
        }

        debug!("Fetched {} occurrences", occurrences.len());
        Ok(occurrences)
    }

    pub async fn rsvp(&self, id: i64, response_status: ResponseStatus) -> ClientResult<()> {
        let request = ApiRequest::post(format!("{}rsvp/", event_path(id)))
            .json(&RsvpRequest { response_status })?;
        self.client.submit(request).await?;
        info!("RSVP {:?} sent for event {}", response_status, id);
        Ok(())
    }
}
