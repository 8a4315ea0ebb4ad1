use super::recurrence::format_recurrence_label;
use crate::api::models::{EventSource, Occurrence, RecurrenceFrequency};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Mission log window when none is given: one day back, ninety days ahead
pub fn default_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (now - Duration::days(1), now + Duration::days(90))
}

/// One row of the mission log: an event and how often it occurs in the window
#[derive(Debug, Clone, PartialEq)]
pub struct MissionRow {
    pub event_id: i64,
    pub title: String,
    pub description: String,
    /// Start and end of the earliest occurrence
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub occurrence_count: usize,
    pub source: EventSource,
    pub is_recurring: bool,
    pub recurrence_frequency: RecurrenceFrequency,
    pub recurrence_interval: u32,
    pub emoji: Option<String>,
}

impl MissionRow {
    fn from_occurrence(occurrence: &Occurrence) -> Self {
        Self {
            event_id: occurrence.event_id,
            title: occurrence.title.clone(),
            description: occurrence.description.clone(),
            start: occurrence.start,
            end: occurrence.end,
            occurrence_count: 1,
            source: occurrence.source,
            is_recurring: occurrence.is_recurring,
            recurrence_frequency: occurrence.recurrence_frequency,
            recurrence_interval: occurrence.recurrence_interval,
            emoji: occurrence.emoji.clone(),
        }
    }

    pub fn recurrence_label(&self) -> String {
        if self.is_recurring {
            format_recurrence_label(self.recurrence_frequency, self.recurrence_interval)
        } else {
            String::new()
        }
    }
}

/// Occurrences ordered by start; ties keep their input order
pub fn sort_by_start(occurrences: &[Occurrence]) -> Vec<&Occurrence> {
    let mut sorted: Vec<&Occurrence> = occurrences.iter().collect();
    sorted.sort_by_key(|o| o.start);
    sorted
}

/// Group occurrences by event into mission log rows, earliest first
pub fn group_missions(occurrences: &[Occurrence]) -> Vec<MissionRow> {
    let mut rows: Vec<MissionRow> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for occurrence in sort_by_start(occurrences) {
        match index.get(&occurrence.event_id) {
            Some(&position) => {
                let row = &mut rows[position];
                row.occurrence_count += 1;
                if occurrence.start < row.start {
                    row.start = occurrence.start;
                    row.end = occurrence.end;
                }
            }
            None => {
                index.insert(occurrence.event_id, rows.len());
                rows.push(MissionRow::from_occurrence(occurrence));
            }
        }
    }

    rows
}

/// First occurrence, by start, that has not ended yet
pub fn next_upcoming(occurrences: &[Occurrence], now: DateTime<Utc>) -> Option<&Occurrence> {
    sort_by_start(occurrences)
        .into_iter()
        .find(|occurrence| occurrence.end > now)
}

/// "1 mission", "4 missions"
pub fn mission_count_label(count: usize) -> String {
    if count == 1 {
        "1 mission".to_string()
    } else {
        format!("{} missions", count)
    }
}

/// Short description for the next-mission panel
pub fn mission_summary(occurrence: &Occurrence) -> String {
    if !occurrence.description.trim().is_empty() {
        return occurrence.description.clone();
    }
    if occurrence.is_recurring {
        let label = format_recurrence_label(
            occurrence.recurrence_frequency,
            occurrence.recurrence_interval,
        );
        if !label.is_empty() {
            return label;
        }
    }
    "Keep crew briefed and ready.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn occurrence(event_id: i64, start: DateTime<Utc>) -> Occurrence {
        Occurrence {
            occurrence_id: format!("{}:{}", event_id, start.to_rfc3339()),
            event_id,
            title: "Standup".to_string(),
            description: String::new(),
            start,
            end: start + Duration::minutes(30),
            all_day: false,
            source: EventSource::Local,
            is_recurring: true,
            recurrence_frequency: RecurrenceFrequency::Weekly,
            recurrence_interval: 1,
            urgency_color: None,
            emoji: None,
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_weekly_event_collapses_to_one_row() {
        // Out of order on purpose
        let occurrences = vec![
            occurrence(7, at(15, 9)),
            occurrence(7, at(1, 9)),
            occurrence(7, at(8, 9)),
        ];

        let rows = group_missions(&occurrences);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].occurrence_count, 3);
        assert_eq!(rows[0].start, at(1, 9));
        assert_eq!(rows[0].end, at(1, 9) + Duration::minutes(30));
        assert_eq!(rows[0].recurrence_label(), "Repeats every week");
    }

    #[test]
    fn test_rows_sorted_by_earliest_start() {
        let occurrences = vec![
            occurrence(1, at(20, 9)),
            occurrence(2, at(3, 9)),
            occurrence(1, at(10, 9)),
            occurrence(3, at(5, 9)),
        ];

        let rows = group_missions(&occurrences);
        let ids: Vec<i64> = rows.iter().map(|r| r.event_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(rows[2].occurrence_count, 2);
        assert_eq!(rows[2].start, at(10, 9));
        assert_eq!(mission_count_label(rows.len()), "3 missions");
        assert_eq!(mission_count_label(1), "1 mission");
    }

    #[test]
    fn test_next_upcoming_skips_finished() {
        let occurrences = vec![occurrence(1, at(1, 9)), occurrence(2, at(2, 9))];
        let now = at(1, 10);
        assert_eq!(next_upcoming(&occurrences, now).unwrap().event_id, 2);
        // Still running counts as upcoming
        let during = at(1, 9) + Duration::minutes(10);
        assert_eq!(next_upcoming(&occurrences, during).unwrap().event_id, 1);
        assert!(next_upcoming(&occurrences, at(3, 0)).is_none());
    }

    #[test]
    fn test_default_window() {
        let now = at(10, 12);
        let (start, end) = default_window(now);
        assert_eq!(start, at(9, 12));
        assert_eq!((end - now).num_days(), 90);
    }

    #[test]
    fn test_mission_summary_fallbacks() {
        let mut occ = occurrence(1, at(1, 9));
        assert_eq!(mission_summary(&occ), "Repeats every week");
        occ.description = "Brief the crew".to_string();
        assert_eq!(mission_summary(&occ), "Brief the crew");
        occ.description.clear();
        occ.is_recurring = false;
        assert_eq!(mission_summary(&occ), "Keep crew briefed and ready.");
    }
}
