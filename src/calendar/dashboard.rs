//! Integration summaries shown next to the mission log

use crate::api::models::{BrightspaceImportResult, BrightspaceStatus, GoogleStatus, GoogleSyncStats};
use chrono::{DateTime, Utc};
use std::fmt;

const NO_CHANGES: &str = "No changes detected.";

/// "created 2, updated 1", or a note that nothing changed
pub fn summarize_google_stats(stats: &GoogleSyncStats) -> String {
    let counters = [
        ("created", stats.created),
        ("updated", stats.updated),
        ("deleted", stats.deleted),
        ("pushed", stats.pushed),
        ("linked existing", stats.linked_existing),
        ("removed duplicates", stats.deduped),
        ("deleted in Google", stats.google_deleted),
    ];
    join_counters(&counters)
}

pub fn summarize_brightspace_result(result: &BrightspaceImportResult) -> String {
    let counters = [
        ("created", result.created),
        ("updated", result.updated),
        ("skipped", result.skipped),
    ];
    join_counters(&counters)
}

fn join_counters(counters: &[(&str, u32)]) -> String {
    let parts: Vec<String> = counters
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(label, count)| format!("{} {}", label, count))
        .collect();
    if parts.is_empty() {
        NO_CHANGES.to_string()
    } else {
        parts.join(", ")
    }
}

/// Most recent sync across the connected integrations
pub fn latest_sync(google: &GoogleStatus, brightspace: &BrightspaceStatus) -> Option<DateTime<Utc>> {
    let google_at = google.last_synced_at.filter(|_| google.connected);
    let brightspace_at = brightspace.last_imported_at.filter(|_| brightspace.connected);
    google_at.into_iter().chain(brightspace_at).max()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Success,
    Error,
    Skipped,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncStatus::Success => "Success",
            SyncStatus::Error => "Error",
            SyncStatus::Skipped => "Skipped",
        };
        write!(f, "{}", label)
    }
}

/// Result of syncing one integration
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub label: &'static str,
    pub status: SyncStatus,
    pub message: String,
}

impl SyncOutcome {
    pub fn skipped(label: &'static str) -> Self {
        Self {
            label,
            status: SyncStatus::Skipped,
            message: "Not connected.".to_string(),
        }
    }
}

/// Overall line for a finished sync, if any integration ran
pub fn sync_headline(outcomes: &[SyncOutcome]) -> Option<&'static str> {
    if outcomes.iter().any(|o| o.status == SyncStatus::Error) {
        Some("Sync completed with issues.")
    } else if outcomes.iter().any(|o| o.status == SyncStatus::Success) {
        Some("Sync completed successfully.")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_google_summary() {
        let stats = GoogleSyncStats {
            created: 2,
            updated: 1,
            deduped: 3,
            ..Default::default()
        };
        assert_eq!(
            summarize_google_stats(&stats),
            "created 2, updated 1, removed duplicates 3"
        );
        assert_eq!(summarize_google_stats(&GoogleSyncStats::default()), NO_CHANGES);
    }

    #[test]
    fn test_brightspace_summary() {
        let result = BrightspaceImportResult {
            skipped: 4,
            ..Default::default()
        };
        assert_eq!(summarize_brightspace_result(&result), "skipped 4");
    }

    #[test]
    fn test_latest_sync_ignores_disconnected() {
        let earlier = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap();

        let google = GoogleStatus {
            connected: true,
            email: None,
            last_synced_at: Some(earlier),
        };
        let mut brightspace = BrightspaceStatus {
            connected: false,
            last_imported_at: Some(later),
        };
        assert_eq!(latest_sync(&google, &brightspace), Some(earlier));

        brightspace.connected = true;
        assert_eq!(latest_sync(&google, &brightspace), Some(later));
        assert_eq!(
            latest_sync(&GoogleStatus::default(), &BrightspaceStatus::default()),
            None
        );
    }

    #[test]
    fn test_sync_headline() {
        let ok = SyncOutcome {
            label: "Google Calendar",
            status: SyncStatus::Success,
            message: NO_CHANGES.to_string(),
        };
        let skipped = SyncOutcome::skipped("Brightspace");
        assert_eq!(
            sync_headline(&[ok.clone(), skipped.clone()]),
            Some("Sync completed successfully.")
        );
        assert_eq!(sync_headline(&[skipped]), None);
    }
}
