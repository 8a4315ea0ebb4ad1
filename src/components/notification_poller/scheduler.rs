use super::actor::PollReport;
use super::handle::NotificationPollerHandle;
use crate::services::notification_label;
use chrono_tz::Tz;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Poll right away, then every `interval`, until `cancel` fires or the session ends.
///
/// A lost session cancels `session_ended` so the owner can stop waiting.
pub fn start_scheduler(
    handle: NotificationPollerHandle,
    interval: Duration,
    tz: Tz,
    cancel: CancellationToken,
    session_ended: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Polling notifications every {}s", interval.as_secs());

        loop {
            match handle.poll().await {
                Ok(report) => log_report(&report, &tz),
                Err(e) if e.requires_login() => {
                    warn!("Session ended, stopping notification poller: {}", e);
                    session_ended.cancel();
                    break;
                }
                Err(e) => error!("Failed to poll notifications: {}", e),
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Notification poller cancelled");
                    break;
                }
                _ = sleep(interval) => {}
            }
        }
    })
}

fn log_report(report: &PollReport, tz: &Tz) {
    for notification in &report.fresh {
        let created = notification.created_at.with_timezone(tz);
        info!(
            "[{}] {} {} ({})",
            notification_label(&notification.kind),
            notification.title,
            notification.message,
            created.format("%Y-%m-%d %H:%M")
        );
    }
    if !report.fresh.is_empty() {
        info!("{} unread notifications", report.unread_count);
    }
}
