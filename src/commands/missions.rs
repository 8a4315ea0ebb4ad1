use super::util::format_local;
use super::{CommandContext, CommandResult};
use crate::api::models::{BrightspaceStatus, GoogleStatus, Occurrence};
use crate::calendar::dashboard::latest_sync;
use crate::calendar::form::all_day_bounds;
use crate::calendar::missions::{
    default_window, group_missions, mission_count_label, mission_summary, next_upcoming,
    MissionRow,
};
use crate::error::{ClientResult, Error};
use crate::utils::time::parse_date;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt::Write;
use tracing::warn;

/// Query window from optional `--from`/`--to` dates, defaulting to the standard window
pub fn mission_window(
    from: Option<&str>,
    to: Option<&str>,
    tz: &Tz,
    now: DateTime<Utc>,
) -> ClientResult<(DateTime<Utc>, DateTime<Utc>)> {
    let (default_start, default_end) = default_window(now);
    let start = match from {
        Some(raw) => all_day_bounds(parse_day(raw)?, tz)?.0,
        None => default_start,
    };
    let end = match to {
        Some(raw) => all_day_bounds(parse_day(raw)?, tz)?.1,
        None => default_end,
    };
    Ok((start, end))
}

fn parse_day(raw: &str) -> ClientResult<chrono::NaiveDate> {
    parse_date(raw)
        .ok_or_else(|| Error::Validation(format!("Invalid date {}, expected YYYY-MM-DD", raw)))
}

pub fn render_rows(rows: &[MissionRow], tz: &Tz) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", mission_count_label(rows.len()));
    for row in rows {
        let emoji = row.emoji.as_deref().map(|e| format!("{} ", e)).unwrap_or_default();
        let _ = write!(
            out,
            "  #{:<6} {}{}  {}",
            row.event_id,
            emoji,
            row.title,
            format_local(&row.start, tz)
        );
        let label = row.recurrence_label();
        if !label.is_empty() {
            let _ = write!(out, "  ({}, {} in window)", label, row.occurrence_count);
        }
        let _ = writeln!(out);
    }
    out
}

pub fn render_next(next: Option<&Occurrence>, tz: &Tz) -> String {
    match next {
        Some(occurrence) => format!(
            "Next mission: {} at {}\n  {}\n",
            occurrence.title,
            format_local(&occurrence.start, tz),
            mission_summary(occurrence)
        ),
        None => "No upcoming missions.\n".to_string(),
    }
}

pub async fn mission_log(ctx: &CommandContext, from: Option<&str>, to: Option<&str>) -> CommandResult {
    let now = Utc::now();
    let (start, end) = mission_window(from, to, &ctx.tz, now)?;
    let occurrences = ctx.services.events.occurrences(start, end).await?;

    print!("{}", render_next(next_upcoming(&occurrences, now), &ctx.tz));
    println!();
    print!("{}", render_rows(&group_missions(&occurrences), &ctx.tz));

    // Integration status is decoration here; a failure must not hide the log
    let google = match ctx.services.integrations.google_status().await {
        Ok(status) => status,
        Err(e) if e.requires_login() => return Err(e),
        Err(e) => {
            warn!("Could not load Google status: {}", e);
            GoogleStatus::default()
        }
    };
    let brightspace = match ctx.services.integrations.brightspace_status().await {
        Ok(status) => status,
        Err(e) if e.requires_login() => return Err(e),
        Err(e) => {
            warn!("Could not load Brightspace status: {}", e);
            BrightspaceStatus::default()
        }
    };
    if let Some(at) = latest_sync(&google, &brightspace) {
        println!();
        println!("Last synced {}", format_local(&at, &ctx.tz));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{EventSource, RecurrenceFrequency};
    use chrono::{Duration, TimeZone};

    fn occurrence(event_id: i64, start: DateTime<Utc>, recurring: bool) -> Occurrence {
        Occurrence {
            occurrence_id: format!("{}:{}", event_id, start.timestamp()),
            event_id,
            title: format!("Mission {}", event_id),
            description: String::new(),
            start,
            end: start + Duration::hours(1),
            all_day: false,
            source: EventSource::Local,
            is_recurring: recurring,
            recurrence_frequency: if recurring {
                RecurrenceFrequency::Weekly
            } else {
                RecurrenceFrequency::None
            },
            recurrence_interval: 2,
            urgency_color: None,
            emoji: None,
        }
    }

    #[test]
    fn test_mission_window() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let (start, end) = mission_window(None, None, &Tz::UTC, now).unwrap();
        assert_eq!(start, now - Duration::days(1));
        assert_eq!(end, now + Duration::days(90));

        let tz: Tz = "Europe/Helsinki".parse().unwrap();
        let (start, end) = mission_window(Some("2024-06-01"), Some("2024-06-30"), &tz, now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 31, 21, 0, 0).unwrap());
        assert_eq!(end.date_naive().to_string(), "2024-06-30");

        assert!(mission_window(Some("June"), None, &tz, now).is_err());
    }

    #[test]
    fn test_render_rows() {
        let base = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        let occurrences = vec![
            occurrence(4, base + Duration::days(14), true),
            occurrence(4, base, true),
            occurrence(8, base + Duration::days(1), false),
        ];
        let text = render_rows(&group_missions(&occurrences), &Tz::UTC);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2 missions");
        assert!(lines[1].contains("#4"));
        assert!(lines[1].contains("(Repeats every 2 weeks, 2 in window)"));
        assert!(lines[2].contains("#8"));
        assert!(!lines[2].contains("Repeats"));
    }

    #[test]
    fn test_render_next() {
        assert_eq!(render_next(None, &Tz::UTC), "No upcoming missions.\n");
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        let text = render_next(Some(&occurrence(1, start, false)), &Tz::UTC);
        assert!(text.starts_with("Next mission: Mission 1 at Mon Jun 3 2024, 9:00 AM"));
        assert!(text.contains("Keep crew briefed and ready."));
    }
}
