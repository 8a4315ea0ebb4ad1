use crate::api::models::{
    BrightspaceImportRequest, BrightspaceImportResult, BrightspaceStatus, GmailWatch,
    GmailWatchStatus, GoogleStatus, GoogleSyncResponse, GoogleSyncStats, OAuthStart,
};
use crate::api::{ApiClient, ApiRequest};
use crate::calendar::dashboard::{
    summarize_brightspace_result, summarize_google_stats, SyncOutcome, SyncStatus,
};
use crate::error::{ClientResult, Error};
use tracing::{info, warn};

const GOOGLE_OAUTH_START_PATH: &str = "/api/google/oauth/start/";
const GOOGLE_STATUS_PATH: &str = "/api/google/status/";
const GOOGLE_SYNC_PATH: &str = "/api/google/sync/";
const GOOGLE_DISCONNECT_PATH: &str = "/api/google/disconnect/";
const BRIGHTSPACE_IMPORT_PATH: &str = "/api/calendar/brightspace/import/";
const BRIGHTSPACE_STATUS_PATH: &str = "/api/brightspace/status/";
const BRIGHTSPACE_DISCONNECT_PATH: &str = "/api/brightspace/disconnect/";
const GMAIL_WATCH_START_PATH: &str = "/api/gmail/watch/start/";
const GMAIL_WATCH_STATUS_PATH: &str = "/api/gmail/watch/status/";
const GMAIL_WATCH_STOP_PATH: &str = "/api/gmail/watch/stop/";

/// Google Calendar, Brightspace and Gmail integrations
#[derive(Debug, Clone)]
pub struct IntegrationService {
    client: ApiClient,
}

impl IntegrationService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Start the Google OAuth flow and return the consent URL
    pub async fn start_google_oauth(&self) -> ClientResult<String> {
        let start: OAuthStart = self
            .client
            .fetch(ApiRequest::post(GOOGLE_OAUTH_START_PATH))
            .await?;
        Ok(start.auth_url)
    }

    pub async fn google_status(&self) -> ClientResult<GoogleStatus> {
        self.client.fetch(ApiRequest::get(GOOGLE_STATUS_PATH)).await
    }

    pub async fn sync_google(&self) -> ClientResult<GoogleSyncStats> {
        let response: GoogleSyncResponse =
            self.client.fetch(ApiRequest::post(GOOGLE_SYNC_PATH)).await?;
        info!("Google sync finished: {:?}", response.stats);
        Ok(response.stats)
    }

    pub async fn disconnect_google(&self) -> ClientResult<()> {
        self.client
            .submit(ApiRequest::delete(GOOGLE_DISCONNECT_PATH))
            .await?;
        info!("Google Calendar disconnected");
        Ok(())
    }

    /// Import a Brightspace iCal feed; without a URL the saved feed is re-imported
    pub async fn import_brightspace(
        &self,
        ics_url: Option<&str>,
    ) -> ClientResult<BrightspaceImportResult> {
        let body = BrightspaceImportRequest {
            ics_url: ics_url
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string),
        };
        let result: BrightspaceImportResult = self
            .client
            .fetch(ApiRequest::post(BRIGHTSPACE_IMPORT_PATH).json(&body)?)
            .await?;
        info!("Brightspace import finished: {:?}", result);
        Ok(result)
    }

    pub async fn brightspace_status(&self) -> ClientResult<BrightspaceStatus> {
        self.client
            .fetch(ApiRequest::get(BRIGHTSPACE_STATUS_PATH))
            .await
    }

    pub async fn disconnect_brightspace(&self) -> ClientResult<()> {
        self.client
            .submit(ApiRequest::delete(BRIGHTSPACE_DISCONNECT_PATH))
            .await?;
        info!("Brightspace feed disconnected");
        Ok(())
    }

    /// Sync every connected integration in turn.
    ///
    /// A failing integration is reported in its outcome; only a lost session aborts.
    pub async fn sync_all(&self) -> ClientResult<Vec<SyncOutcome>> {
        let google = status_or_disconnected(self.google_status().await)?;
        let brightspace = status_or_disconnected(self.brightspace_status().await)?;

        if !google.connected && !brightspace.connected {
            return Err(Error::Validation(
                "Connect Google or Brightspace before syncing.".to_string(),
            ));
        }

        let mut outcomes = Vec::with_capacity(2);

        outcomes.push(if google.connected {
            outcome(
                "Google Calendar",
                self.sync_google().await.map(|s| summarize_google_stats(&s)),
                "Google sync failed.",
            )?
        } else {
            SyncOutcome::skipped("Google Calendar")
        });

        outcomes.push(if brightspace.connected {
            outcome(
                "Brightspace",
                self.import_brightspace(None)
                    .await
                    .map(|r| summarize_brightspace_result(&r)),
                "Brightspace sync failed.",
            )?
        } else {
            SyncOutcome::skipped("Brightspace")
        });

        Ok(outcomes)
    }

    pub async fn start_gmail_watch(&self) -> ClientResult<GmailWatch> {
        self.client
            .fetch(ApiRequest::post(GMAIL_WATCH_START_PATH))
            .await
    }

    pub async fn gmail_watch_status(&self) -> ClientResult<GmailWatchStatus> {
        self.client
            .fetch(ApiRequest::get(GMAIL_WATCH_STATUS_PATH))
            .await
    }

    pub async fn stop_gmail_watch(&self) -> ClientResult<()> {
        self.client
            .submit(ApiRequest::post(GMAIL_WATCH_STOP_PATH))
            .await?;
        info!("Gmail watch stopped");
        Ok(())
    }
}

// A status that cannot be read counts as not connected
fn status_or_disconnected<T: Default>(result: ClientResult<T>) -> ClientResult<T> {
    match result {
        Err(e) if e.requires_login() => Err(e),
        Err(e) => {
            warn!("Failed to read integration status: {}", e);
            Ok(T::default())
        }
        ok => ok,
    }
}

fn outcome(
    label: &'static str,
    result: ClientResult<String>,
    fallback: &str,
) -> ClientResult<SyncOutcome> {
    match result {
        Ok(message) => Ok(SyncOutcome {
            label,
            status: SyncStatus::Success,
            message,
        }),
        Err(e) if e.requires_login() => Err(e),
        Err(e) => {
            warn!("{} sync failed: {}", label, e);
            let message = match e {
                Error::Api { message, .. } | Error::Validation(message) => message,
                _ => fallback.to_string(),
            };
            Ok(SyncOutcome {
                label,
                status: SyncStatus::Error,
                message,
            })
        }
    }
}
