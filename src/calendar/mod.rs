//! Calendar view model: everything between the occurrence list and what gets drawn.
//!
//! All calendar-day math happens in the configured timezone, never in UTC.

pub mod dashboard;
pub mod day_view;
pub mod form;
pub mod grid;
pub mod missions;
pub mod recurrence;

pub use day_view::{day_bars, BarColor, DayBar};
pub use form::{all_day_bounds, EditForm, EventForm};
pub use grid::{group_by_day, month_range, CalendarCell, MonthGrid, WEEKDAY_LABELS};
pub use missions::{default_window, group_missions, next_upcoming, MissionRow};
pub use recurrence::format_recurrence_label;
