//! Create and edit forms for events.
//!
//! Date and time fields are kept as the text the user typed, in local wall-clock time,
//! so an unparseable value is a state the form can be in rather than an error.

use crate::api::models::{Event, EventPatch, NewEvent, Occurrence, RecurrenceFrequency};
use crate::error::{ClientResult, Error};
use crate::utils::time::{
    end_of_day, format_local_input, local_datetime, parse_date, parse_local_datetime,
    resolve_local, start_of_day,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

/// Start and end of an all-day event on `date`: local midnight through 23:59:59.999
pub fn all_day_bounds(date: NaiveDate, tz: &Tz) -> ClientResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = start_of_day(date, tz).ok_or_else(invalid_date)?;
    let end = end_of_day(date, tz).ok_or_else(invalid_date)?;
    Ok((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}

fn invalid_date() -> Error {
    Error::Validation("Invalid date selected.".to_string())
}

fn to_utc(value: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let naive = parse_local_datetime(value)?;
    resolve_local(tz, &naive).map(|dt| dt.with_timezone(&Utc))
}

/// State of the create-event form
#[derive(Debug, Clone, PartialEq)]
pub struct EventForm {
    pub title: String,
    pub description: String,
    /// `YYYY-MM-DDTHH:MM`
    pub start: String,
    pub end: String,
    /// `YYYY-MM-DD`, used when `all_day` is set
    pub start_date: String,
    pub all_day: bool,
    pub recurrence_enabled: bool,
    pub recurrence_frequency: RecurrenceFrequency,
    pub recurrence_interval: u32,
}

impl EventForm {
    /// Empty form for `date`, 09:00 to 10:00
    pub fn for_date(date: NaiveDate) -> Self {
        let start = date.and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN));
        let end = start + Duration::hours(1);
        Self {
            title: String::new(),
            description: String::new(),
            start: format_local_input(&start),
            end: format_local_input(&end),
            start_date: date.format("%Y-%m-%d").to_string(),
            all_day: false,
            recurrence_enabled: false,
            recurrence_frequency: RecurrenceFrequency::Weekly,
            recurrence_interval: 1,
        }
    }

    pub fn set_all_day(&mut self, all_day: bool) {
        if all_day {
            if let Some(start) = parse_local_datetime(&self.start) {
                self.start_date = start.date().format("%Y-%m-%d").to_string();
            }
        }
        self.all_day = all_day;
    }

    /// Move both start and end to `value`, keeping their times
    pub fn set_start_date(&mut self, value: &str) {
        self.start_date = value.to_string();
        let Some(date) = parse_date(value) else {
            return;
        };
        if let Some(start) = parse_local_datetime(&self.start) {
            self.start = format_local_input(&date.and_time(start.time()));
        }
        if let Some(end) = parse_local_datetime(&self.end) {
            self.end = format_local_input(&date.and_time(end.time()));
        }
    }

    /// Change the start; an end that is no longer after it moves to start + 1h
    pub fn set_start(&mut self, value: &str) {
        if let Some(start) = parse_local_datetime(value) {
            let end_is_behind = match parse_local_datetime(&self.end) {
                Some(end) => end <= start,
                None => true,
            };
            if end_is_behind {
                self.end = format_local_input(&(start + Duration::hours(1)));
            }
            self.start_date = start.date().format("%Y-%m-%d").to_string();
        }
        self.start = value.to_string();
    }

    pub fn set_end(&mut self, value: &str) {
        self.end = value.to_string();
    }

    /// Interval input; anything unparseable or below one becomes one
    pub fn set_recurrence_interval(&mut self, value: &str) {
        self.recurrence_interval = value.trim().parse::<u32>().unwrap_or(1).max(1);
    }

    /// Validate and build the request body
    pub fn to_new_event(&self, tz: &Tz) -> ClientResult<NewEvent> {
        let (start, end) = if self.all_day {
            if self.start_date.trim().is_empty() {
                return Err(Error::Validation("Please choose a date.".to_string()));
            }
            let date = parse_date(&self.start_date).ok_or_else(invalid_date)?;
            all_day_bounds(date, tz)?
        } else {
            let (Some(start), Some(end)) = (to_utc(&self.start, tz), to_utc(&self.end, tz)) else {
                return Err(Error::Validation(
                    "Please provide valid start and end times.".to_string(),
                ));
            };
            if end < start {
                return Err(Error::Validation("End must be after start.".to_string()));
            }
            (start, end)
        };

        let (recurrence_frequency, recurrence_interval) = if self.recurrence_enabled {
            (self.recurrence_frequency, self.recurrence_interval.max(1))
        } else {
            (RecurrenceFrequency::None, 1)
        };

        Ok(NewEvent {
            title: self.title.clone(),
            description: self.description.clone(),
            start,
            end,
            all_day: self.all_day,
            recurrence_frequency,
            recurrence_interval,
            recurrence_count: None,
            recurrence_end_date: None,
        })
    }
}

/// State of the edit form opened from an occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct EditForm {
    pub event_id: i64,
    pub title: String,
    pub description: String,
    pub start: String,
    pub end: String,
    pub all_day: bool,
    pub emoji: String,
}

impl EditForm {
    pub fn from_occurrence(occurrence: &Occurrence, tz: &Tz) -> Self {
        Self {
            event_id: occurrence.event_id,
            title: occurrence.title.clone(),
            description: occurrence.description.clone(),
            start: format_local_input(&local_datetime(&occurrence.start, tz)),
            end: format_local_input(&local_datetime(&occurrence.end, tz)),
            all_day: occurrence.all_day,
            emoji: occurrence.emoji.clone().unwrap_or_default(),
        }
    }

    pub fn from_event(event: &Event, tz: &Tz) -> Self {
        Self {
            event_id: event.id,
            title: event.title.clone(),
            description: event.description.clone(),
            start: format_local_input(&local_datetime(&event.start, tz)),
            end: format_local_input(&local_datetime(&event.end, tz)),
            all_day: event.all_day,
            emoji: event.emoji.clone().unwrap_or_default(),
        }
    }

    /// Patch for the underlying event, with title and description trimmed
    pub fn to_patch(&self, tz: &Tz) -> ClientResult<EventPatch> {
        let (Some(start), Some(end)) = (to_utc(&self.start, tz), to_utc(&self.end, tz)) else {
            return Err(Error::Validation(
                "Please provide valid start and end times.".to_string(),
            ));
        };
        if end < start {
            return Err(Error::Validation("End must be after start.".to_string()));
        }

        Ok(EventPatch {
            title: Some(self.title.trim().to_string()),
            description: Some(self.description.trim().to_string()),
            start: Some(start),
            end: Some(end),
            all_day: Some(self.all_day),
            emoji: Some(self.emoji.clone()),
            ..Default::default()
        })
    }
}
