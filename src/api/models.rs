//! Request and response schemas for the calendar backend.
//!
//! Everything the server sends is decoded into these types at the client boundary, so a
//! malformed payload fails with [`crate::error::Error::Decode`] instead of leaking
//! half-filled values into the calendar views.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Recurrence rule frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceFrequency {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceFrequency {
    /// Singular unit used in labels ("day", "week", ...)
    pub fn unit_label(&self) -> Option<&'static str> {
        match self {
            RecurrenceFrequency::None => None,
            RecurrenceFrequency::Daily => Some("day"),
            RecurrenceFrequency::Weekly => Some("week"),
            RecurrenceFrequency::Monthly => Some("month"),
            RecurrenceFrequency::Yearly => Some("year"),
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, RecurrenceFrequency::None)
    }
}

/// Where an event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    #[default]
    Local,
    Google,
    Brightspace,
    #[serde(other)]
    Other,
}

/// Attendee RSVP state, spelled the way Google Calendar spells it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    #[default]
    NeedsAction,
    Accepted,
    Declined,
    Tentative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub response_status: ResponseStatus,
    #[serde(default)]
    pub is_self: bool,
    #[serde(default)]
    pub is_organizer: bool,
    #[serde(default)]
    pub optional: bool,
}

/// A stored event as returned by `/api/events/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub recurrence_frequency: RecurrenceFrequency,
    #[serde(default = "default_interval")]
    pub recurrence_interval: u32,
    #[serde(default)]
    pub recurrence_count: Option<u32>,
    #[serde(default)]
    pub recurrence_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub source: EventSource,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub pilot: Option<i64>,
    #[serde(default)]
    pub pilot_username: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One dated instance of an event, expanded by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    pub occurrence_id: String,
    pub event_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub source: EventSource,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_frequency: RecurrenceFrequency,
    #[serde(default = "default_interval")]
    pub recurrence_interval: u32,
    #[serde(default)]
    pub urgency_color: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
}

impl Occurrence {
    /// Whether the occurrence respects `end >= start`
    pub fn is_well_formed(&self) -> bool {
        self.end >= self.start
    }
}

fn default_interval() -> u32 {
    1
}

/// Body for `POST /api/events/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub recurrence_frequency: RecurrenceFrequency,
    pub recurrence_interval: u32,
    pub recurrence_count: Option<u32>,
    pub recurrence_end_date: Option<NaiveDate>,
}

/// Body for `PATCH /api/events/{id}/`; unset fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_frequency: Option<RecurrenceFrequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_interval: Option<u32>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RsvpRequest {
    pub response_status: ResponseStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl RegisterRequest {
    /// Blank fields are dropped. The email only goes along with an invite token.
    pub fn new(
        username: &str,
        password: String,
        invite_token: Option<String>,
        email: Option<String>,
    ) -> Self {
        let invite_token = invite_token.filter(|token| !token.trim().is_empty());
        let email = match invite_token {
            Some(_) => email.filter(|email| !email.trim().is_empty()),
            None => None,
        };
        Self {
            username: username.trim().to_string(),
            password,
            invite_token,
            email,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub username: String,
}

/// `POST /api/token/` response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// `POST /api/token/refresh/` response
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub access: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub event: Option<i64>,
}

impl Notification {
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationFeed {
    #[serde(default)]
    pub results: Vec<Notification>,
    #[serde(default)]
    pub unread_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkReadRequest {
    pub all: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GoogleStatus {
    pub connected: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthStart {
    pub auth_url: String,
}

/// Counters reported by a Google sync
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GoogleSyncStats {
    #[serde(default)]
    pub created: u32,
    #[serde(default)]
    pub updated: u32,
    #[serde(default)]
    pub deleted: u32,
    #[serde(default)]
    pub pushed: u32,
    #[serde(default)]
    pub linked_existing: u32,
    #[serde(default)]
    pub deduped: u32,
    #[serde(default)]
    pub google_deleted: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleSyncResponse {
    #[serde(default)]
    pub stats: GoogleSyncStats,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BrightspaceStatus {
    pub connected: bool,
    #[serde(default)]
    pub last_imported_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BrightspaceImportRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ics_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BrightspaceImportResult {
    #[serde(default)]
    pub created: u32,
    #[serde(default)]
    pub updated: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default)]
    pub saved_url: bool,
    #[serde(default)]
    pub used_saved_url: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GmailWatchStatus {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub needs_renewal: bool,
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GmailWatch {
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub resource_id: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Event fields the email parser pulled out of a message
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ParsedEventData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub recurrence_frequency: RecurrenceFrequency,
    #[serde(default = "default_interval")]
    pub recurrence_interval: u32,
    #[serde(default)]
    pub recurrence_count: Option<u32>,
    #[serde(default)]
    pub attendees: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParsedEmail {
    pub id: i64,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub parsed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parsed_data: ParsedEventData,
    #[serde(default)]
    pub email_body: String,
}

/// Response of approving a parsed email or parsing free text
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedFromEmail {
    pub event: Event,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseEmailRequest {
    pub email_text: String,
}
