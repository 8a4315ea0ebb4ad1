use super::util::{confirm, format_local, read_text};
use super::{CommandContext, CommandResult, PendingAction};
use crate::api::models::{Notification, ParsedEmail};
use crate::services::notification_label;
use chrono_tz::Tz;
use std::fmt::Write;
use std::path::Path;

pub fn render_notification(notification: &Notification, tz: &Tz) -> String {
    let marker = if notification.is_unread() { '*' } else { ' ' };
    let mut line = format!(
        "{} {}  {}: {}",
        marker,
        format_local(&notification.created_at, tz),
        notification_label(&notification.kind),
        notification.title
    );
    if !notification.message.is_empty() {
        let _ = write!(line, " - {}", notification.message);
    }
    line
}

pub fn render_pending(email: &ParsedEmail, tz: &Tz) -> String {
    let mut out = format!("#{} {}", email.id, email.subject);
    if let Some(sender) = &email.sender {
        let _ = write!(out, " (from {})", sender);
    }
    let data = &email.parsed_data;
    if let Some(title) = &data.title {
        let _ = write!(out, "\n    Event: {}", title);
    }
    if let Some(start) = &data.start {
        let _ = write!(out, "\n    Starts: {}", format_local(start, tz));
    }
    if let Some(location) = &data.location {
        let _ = write!(out, "\n    Where: {}", location);
    }
    out
}

pub async fn list(ctx: &CommandContext, limit: Option<u32>, mark_read: bool) -> CommandResult {
    let limit = match limit {
        Some(limit) => limit,
        None => ctx.config.read().await.notification_limit,
    };
    let feed = ctx.services.notifications.list(limit).await?;

    println!("{} unread", feed.unread_count);
    for notification in &feed.results {
        println!("{}", render_notification(notification, &ctx.tz));
    }

    if mark_read && feed.unread_count > 0 {
        ctx.services.notifications.mark_all_read().await?;
        println!("Marked all as read.");
    }
    Ok(())
}

pub async fn pending(ctx: &CommandContext, action: PendingAction) -> CommandResult {
    let parsed_emails = &ctx.services.parsed_emails;
    match action {
        PendingAction::List => {
            let pending = parsed_emails.pending().await?;
            if pending.is_empty() {
                println!("No suggestions waiting for review.");
            }
            for email in &pending {
                println!("{}", render_pending(email, &ctx.tz));
            }
        }
        PendingAction::Approve { id } => {
            let event = parsed_emails.approve(id).await?;
            println!(
                "Created mission #{} {} at {}.",
                event.id,
                event.title,
                format_local(&event.start, &ctx.tz)
            );
        }
        PendingAction::Reject { id } => {
            if !confirm("Reject this suggestion?", ctx.assume_yes).await? {
                println!("Suggestion kept.");
                return Ok(());
            }
            parsed_emails.reject(id).await?;
            println!("Suggestion rejected.");
        }
    }
    Ok(())
}

pub async fn parse_email(ctx: &CommandContext, file: Option<&Path>) -> CommandResult {
    let text = read_text(file).await?;
    let event = ctx.services.parsed_emails.parse(&text).await?;
    println!(
        "Created mission #{} {} at {}.",
        event.id,
        event.title,
        format_local(&event.start, &ctx.tz)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ParsedEventData;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_render_notification() {
        let notification: Notification = serde_json::from_value(json!({
            "id": 3,
            "type": "google_sync",
            "title": "Calendar synced",
            "message": "created 2",
            "created_at": "2024-05-01T08:30:00Z"
        }))
        .unwrap();
        assert_eq!(
            render_notification(&notification, &Tz::UTC),
            "* Wed May 1 2024, 8:30 AM  Google Calendar sync: Calendar synced - created 2"
        );
    }

    #[test]
    fn test_render_pending() {
        let email = ParsedEmail {
            id: 5,
            subject: "Flight review".to_string(),
            sender: Some("ops@example.com".to_string()),
            parsed_at: None,
            parsed_data: ParsedEventData {
                title: Some("Review".to_string()),
                start: Some(Utc.with_ymd_and_hms(2024, 5, 2, 14, 0, 0).unwrap()),
                ..Default::default()
            },
            email_body: String::new(),
        };
        let text = render_pending(&email, &Tz::UTC);
        assert!(text.starts_with("#5 Flight review (from ops@example.com)"));
        assert!(text.contains("Event: Review"));
        assert!(text.contains("Starts: Thu May 2 2024, 2:00 PM"));
        assert!(!text.contains("Where"));
    }
}
