use super::util::{confirm, date_or_today, format_local, month_or_current, time_on, today};
use super::{CommandContext, CommandResult, CreateArgs, EditArgs};
use crate::api::models::ResponseStatus;
use crate::calendar::day_view::{day_bars, hour_labels, DayBar};
use crate::calendar::form::{all_day_bounds, EditForm, EventForm};
use crate::calendar::grid::{month_range, shift_month, MonthGrid, WEEKDAY_LABELS};
use crate::calendar::recurrence::format_recurrence_label;
use crate::error::{ClientResult, Error};
use chrono_tz::Tz;
use std::fmt::Write;
use tracing::debug;

/// Month grid as text: a week per line, then the events of each day
pub fn render_month(grid: &MonthGrid) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", grid.title());
    let _ = writeln!(
        out,
        "{}",
        WEEKDAY_LABELS
            .iter()
            .map(|label| format!("{:>5}", label))
            .collect::<String>()
    );

    for week in grid.weeks() {
        let line: String = week
            .iter()
            .map(|cell| {
                let marker = if cell.is_today {
                    '*'
                } else if !cell.occurrences.is_empty() {
                    '+'
                } else {
                    ' '
                };
                if cell.in_current_month {
                    format!("{:>4}{}", cell.label, marker)
                } else {
                    format!("{:>4}{}", "", ' ')
                }
            })
            .collect();
        let _ = writeln!(out, "{}", line.trim_end());
    }

    for cell in grid.cells.iter().filter(|c| c.in_current_month && !c.occurrences.is_empty()) {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", cell.date.format("%a %b %-d"));
        for occurrence in cell.visible() {
            let _ = writeln!(out, "  #{:<6} {}", occurrence.event_id, occurrence.title);
        }
        if cell.hidden_count() > 0 {
            let _ = writeln!(out, "  +{} more", cell.hidden_count());
        }
    }

    out
}

/// Day timeline as text: an hour heading, then one line per bar starting in that hour
pub fn render_day(bars: &[DayBar]) -> String {
    if bars.is_empty() {
        return "No missions scheduled.\n".to_string();
    }
    let labels = hour_labels();
    let mut current_hour = None;
    let mut out = String::new();
    for bar in bars {
        let when = if bar.occurrence.all_day {
            "All day".to_string()
        } else {
            let hour = ((bar.top_percent / 100.0 * 24.0).floor() as usize).min(23);
            if current_hour != Some(hour) {
                let _ = writeln!(out, "{}", labels[hour]);
                current_hour = Some(hour);
            }
            format!("{} - {}", bar.start_label, bar.end_label)
        };
        let _ = writeln!(
            out,
            "{:<22} {:>4} min  [{}] #{} {}",
            when, bar.duration_minutes, bar.color, bar.occurrence.event_id, bar.occurrence.title
        );
    }
    out
}

pub async fn month(ctx: &CommandContext, month: Option<&str>, offset: i32) -> CommandResult {
    let reference = month_or_current(month, &ctx.tz)?;
    let reference = shift_month(reference, offset)
        .ok_or_else(|| Error::Validation(format!("Month offset {} is out of range.", offset)))?;
    let (start, end) = month_range(reference, &ctx.tz)?;
    debug!("Loading {} to {}", start, end);

    let occurrences = ctx.services.events.occurrences(start, end).await?;
    let grid = MonthGrid::build(reference, &occurrences, &ctx.tz, today(&ctx.tz));
    print!("{}", render_month(&grid));
    Ok(())
}

pub async fn day(ctx: &CommandContext, date: Option<&str>) -> CommandResult {
    let date = date_or_today(date, &ctx.tz)?;
    let (start, end) = all_day_bounds(date, &ctx.tz)?;

    let mut occurrences = ctx.services.events.occurrences(start, end).await?;
    occurrences.sort_by_key(|o| o.start);
    println!("{}", date.format("%A, %B %-d %Y"));
    print!("{}", render_day(&day_bars(&occurrences, &ctx.tz)));
    Ok(())
}

/// Fill the create form the way a user would, field by field
pub fn build_form(args: &CreateArgs, tz: &Tz) -> ClientResult<EventForm> {
    let date = date_or_today(args.date.as_deref(), tz)?;
    let mut form = EventForm::for_date(date);
    form.title = args.title.trim().to_string();
    form.description = args.description.clone().unwrap_or_default();

    if args.all_day {
        form.set_all_day(true);
    }
    if let Some(start) = &args.start {
        form.set_start(&time_on(date, start)?);
    }
    if let Some(end) = &args.end {
        form.set_end(&time_on(date, end)?);
    }
    if let Some(repeat) = args.repeat {
        form.recurrence_enabled = true;
        form.recurrence_frequency = repeat.into();
    }
    if let Some(every) = &args.every {
        form.set_recurrence_interval(every);
    }
    Ok(form)
}

pub async fn create(ctx: &CommandContext, args: CreateArgs) -> CommandResult {
    let form = build_form(&args, &ctx.tz)?;
    let new_event = form.to_new_event(&ctx.tz)?;
    let event = ctx.services.events.create(&new_event).await?;

    println!(
        "Created mission #{} {} at {}.",
        event.id,
        event.title,
        format_local(&event.start, &ctx.tz)
    );
    let label = format_recurrence_label(event.recurrence_frequency, event.recurrence_interval);
    if !label.is_empty() {
        println!("{}", label);
    }
    Ok(())
}

pub async fn edit(ctx: &CommandContext, args: EditArgs) -> CommandResult {
    let event = ctx.services.events.get(args.event_id).await?;
    let mut form = EditForm::from_event(&event, &ctx.tz);

    if let Some(title) = args.title {
        form.title = title;
    }
    if let Some(description) = args.description {
        form.description = description;
    }
    if let Some(start) = args.start {
        form.start = start;
    }
    if let Some(end) = args.end {
        form.end = end;
    }
    if let Some(emoji) = args.emoji {
        form.emoji = emoji;
    }

    let patch = form.to_patch(&ctx.tz)?;
    let updated = ctx.services.events.update(form.event_id, &patch).await?;
    println!("Updated mission #{} {}.", updated.id, updated.title);
    Ok(())
}

pub async fn delete(ctx: &CommandContext, event_id: i64) -> CommandResult {
    let event = ctx.services.events.get(event_id).await?;
    let question = if event.recurrence_frequency.is_recurring() {
        "Delete this entire recurring mission?"
    } else {
        "Delete this mission?"
    };

    if !confirm(question, ctx.assume_yes).await? {
        println!("Nothing deleted.");
        return Ok(());
    }

    ctx.services.events.delete(event_id).await?;
    println!("Deleted mission #{} {}.", event.id, event.title);
    Ok(())
}

pub async fn rsvp(ctx: &CommandContext, event_id: i64, status: ResponseStatus) -> CommandResult {
    ctx.services.events.rsvp(event_id, status).await?;
    println!("Response recorded for mission #{}.", event_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{EventSource, Occurrence, RecurrenceFrequency};
    use crate::commands::RepeatArg;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn occurrence(event_id: i64, day: u32, title: &str) -> Occurrence {
        let start = Utc.with_ymd_and_hms(2024, 2, day, 15, 0, 0).unwrap();
        Occurrence {
            occurrence_id: format!("{}:{}", event_id, day),
            event_id,
            title: title.to_string(),
            description: String::new(),
            start,
            end: start + Duration::minutes(45),
            all_day: false,
            source: EventSource::Local,
            is_recurring: false,
            recurrence_frequency: RecurrenceFrequency::None,
            recurrence_interval: 1,
            urgency_color: None,
            emoji: None,
        }
    }

    fn create_args(title: &str) -> CreateArgs {
        CreateArgs {
            title: title.to_string(),
            date: Some("2024-04-10".to_string()),
            start: None,
            end: None,
            all_day: false,
            description: None,
            repeat: None,
            every: None,
        }
    }

    #[test]
    fn test_render_month() {
        let reference = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 2, 14).unwrap();
        let occurrences: Vec<Occurrence> = (1..=5)
            .map(|i| occurrence(i, 14, &format!("Sortie {}", i)))
            .collect();
        let grid = MonthGrid::build(reference, &occurrences, &Tz::UTC, today);

        let text = render_month(&grid);
        assert!(text.starts_with("February 2024\n"));
        assert!(text.contains("  Sun  Mon"));
        assert!(text.contains("14*"));
        assert!(text.contains("Wed Feb 14"));
        assert!(text.contains("Sortie 3"));
        assert!(!text.contains("Sortie 4"));
        assert!(text.contains("+2 more"));
    }

    #[test]
    fn test_render_day() {
        assert_eq!(render_day(&[]), "No missions scheduled.\n");

        let bars = day_bars(&[occurrence(9, 3, "Briefing")], &Tz::UTC);
        let text = render_day(&bars);
        assert!(text.starts_with("3 PM\n"));
        assert!(text.contains("3:00 PM - 3:45 PM"));
        assert!(text.contains("45 min"));
        assert!(text.contains("#9 Briefing"));
    }

    #[test]
    fn test_build_form_defaults_and_end_bump() {
        let mut args = create_args("  Standup ");
        args.start = Some("10:30".to_string());
        let form = build_form(&args, &Tz::UTC).unwrap();
        assert_eq!(form.title, "Standup");
        assert_eq!(form.start, "2024-04-10T10:30");
        // The default 10:00 end is behind the new start
        assert_eq!(form.end, "2024-04-10T11:30");
        assert!(!form.recurrence_enabled);
    }

    #[test]
    fn test_build_form_recurrence() {
        let mut args = create_args("Drill");
        args.repeat = Some(RepeatArg::Monthly);
        args.every = Some("0".to_string());
        let form = build_form(&args, &Tz::UTC).unwrap();
        let event = form.to_new_event(&Tz::UTC).unwrap();
        assert_eq!(event.recurrence_frequency, RecurrenceFrequency::Monthly);
        assert_eq!(event.recurrence_interval, 1);
    }

    #[test]
    fn test_build_form_rejects_end_before_start() {
        let mut args = create_args("Drill");
        args.start = Some("14:00".to_string());
        args.end = Some("13:00".to_string());
        let form = build_form(&args, &Tz::UTC).unwrap();
        let err = form.to_new_event(&Tz::UTC).unwrap_err();
        assert_eq!(err.to_string(), "End must be after start.");
    }
}
