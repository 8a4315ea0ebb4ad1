//! Month grid: Sunday-first weeks covering a whole month, with each day's occurrences.

use crate::api::models::Occurrence;
use crate::error::{config_error, ClientResult};
use crate::utils::time::{add_months, end_of_day, first_of_month, last_of_month, local_date, start_of_day};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Occurrences listed in a cell before the rest are summarised as "+N more"
pub const MAX_VISIBLE_PER_CELL: usize = 3;

/// One day of the grid
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// Day of month
    pub label: u32,
    pub in_current_month: bool,
    pub is_today: bool,
    pub occurrences: Vec<Occurrence>,
}

impl CalendarCell {
    pub fn visible(&self) -> &[Occurrence] {
        let shown = self.occurrences.len().min(MAX_VISIBLE_PER_CELL);
        &self.occurrences[..shown]
    }

    pub fn hidden_count(&self) -> usize {
        self.occurrences.len().saturating_sub(MAX_VISIBLE_PER_CELL)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthGrid {
    /// First day of the displayed month
    pub month: NaiveDate,
    pub cells: Vec<CalendarCell>,
}

impl MonthGrid {
    /// Build the grid for the month containing `reference`.
    ///
    /// Occurrences are bucketed by the local calendar day of their start; the cell count
    /// is always a multiple of seven.
    pub fn build(reference: NaiveDate, occurrences: &[Occurrence], tz: &Tz, today: NaiveDate) -> Self {
        let month = first_of_month(reference);
        let offset = month.weekday().num_days_from_sunday() as i64;
        let days = last_of_month(month).day() as i64;
        let total = ((offset + days + 6) / 7) * 7;

        let mut by_day = group_by_day(occurrences, tz);
        let first_visible = month - Duration::days(offset);

        let cells = (0..total)
            .map(|index| {
                let date = first_visible + Duration::days(index);
                CalendarCell {
                    date,
                    label: date.day(),
                    in_current_month: date.month() == month.month() && date.year() == month.year(),
                    is_today: date == today,
                    occurrences: by_day.remove(&date).unwrap_or_default(),
                }
            })
            .collect();

        Self { month, cells }
    }

    /// Rows of seven cells
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell]> {
        self.cells.chunks(7)
    }

    /// "February 2024"
    pub fn title(&self) -> String {
        month_title(self.month)
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&CalendarCell> {
        self.cells.iter().find(|cell| cell.date == date)
    }

    /// Occurrences inside the displayed month
    pub fn occurrence_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.in_current_month)
            .map(|cell| cell.occurrences.len())
            .sum()
    }
}

/// Bucket occurrences by the local calendar day of their start, ordered by start
pub fn group_by_day(occurrences: &[Occurrence], tz: &Tz) -> HashMap<NaiveDate, Vec<Occurrence>> {
    let mut map: HashMap<NaiveDate, Vec<Occurrence>> = HashMap::new();
    for occurrence in occurrences {
        map.entry(local_date(&occurrence.start, tz))
            .or_default()
            .push(occurrence.clone());
    }
    for day in map.values_mut() {
        day.sort_by_key(|o| o.start);
    }
    map
}

pub fn month_title(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// First day of the month `offset` months away from the one containing `date`
pub fn shift_month(date: NaiveDate, offset: i32) -> Option<NaiveDate> {
    add_months(first_of_month(date), offset)
}

/// First and last instant of the month containing `date`, in local time
pub fn month_range(date: NaiveDate, tz: &Tz) -> ClientResult<(DateTime<Utc>, DateTime<Utc>)> {
    let first = first_of_month(date);
    let last = last_of_month(date);
    let start = start_of_day(first, tz)
        .ok_or_else(|| config_error(&format!("No local midnight on {} in {}", first, tz)))?;
    let end = end_of_day(last, tz)
        .ok_or_else(|| config_error(&format!("No end of day on {} in {}", last, tz)))?;
    Ok((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}
