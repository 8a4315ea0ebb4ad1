use crate::api::models::{EventSource, Occurrence};
use crate::utils::time::{format_clock, format_hour, local_datetime};
use chrono::Timelike;
use chrono_tz::Tz;
use std::fmt;

const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// Bars never get shorter than this share of the day
pub const MIN_BAR_HEIGHT_PERCENT: f64 = 2.0;

/// Colour of a bar, by urgency first, then source, then recurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarColor {
    Urgent,
    Soon,
    Google,
    Brightspace,
    Recurring,
    Default,
}

impl BarColor {
    pub fn for_occurrence(occurrence: &Occurrence) -> Self {
        match occurrence.urgency_color.as_deref() {
            Some("red") => return BarColor::Urgent,
            Some("yellow") => return BarColor::Soon,
            _ => {}
        }
        match occurrence.source {
            EventSource::Google => BarColor::Google,
            EventSource::Brightspace => BarColor::Brightspace,
            _ if occurrence.recurrence_frequency.is_recurring() => BarColor::Recurring,
            _ => BarColor::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BarColor::Urgent => "urgent",
            BarColor::Soon => "soon",
            BarColor::Google => "google",
            BarColor::Brightspace => "brightspace",
            BarColor::Recurring => "recurring",
            BarColor::Default => "default",
        }
    }
}

impl fmt::Display for BarColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An occurrence placed on the 24-hour day column
#[derive(Debug, Clone, PartialEq)]
pub struct DayBar {
    pub occurrence: Occurrence,
    /// Distance from midnight as a share of the day
    pub top_percent: f64,
    pub height_percent: f64,
    pub duration_minutes: i64,
    pub start_label: String,
    pub end_label: String,
    pub color: BarColor,
}

impl DayBar {
    pub fn new(occurrence: &Occurrence, tz: &Tz) -> Self {
        let start = local_datetime(&occurrence.start, tz);
        let end = local_datetime(&occurrence.end, tz);
        let start_minutes = (start.hour() * 60 + start.minute()) as f64;
        let duration_minutes = (occurrence.end - occurrence.start).num_minutes();

        let top_percent = start_minutes / MINUTES_PER_DAY * 100.0;
        let height_percent =
            (duration_minutes as f64 / MINUTES_PER_DAY * 100.0).max(MIN_BAR_HEIGHT_PERCENT);

        Self {
            occurrence: occurrence.clone(),
            top_percent,
            height_percent,
            duration_minutes,
            start_label: format_clock(&start),
            end_label: format_clock(&end),
            color: BarColor::for_occurrence(occurrence),
        }
    }
}

/// Bars for one day's occurrences, in the order given
pub fn day_bars(occurrences: &[Occurrence], tz: &Tz) -> Vec<DayBar> {
    occurrences.iter().map(|o| DayBar::new(o, tz)).collect()
}

/// "12 AM" through "11 PM"
pub fn hour_labels() -> Vec<String> {
    (0..24).map(format_hour).collect()
}
