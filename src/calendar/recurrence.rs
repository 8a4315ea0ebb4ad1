use crate::api::models::RecurrenceFrequency;

/// Human label for a recurrence rule; empty when the event does not repeat
pub fn format_recurrence_label(frequency: RecurrenceFrequency, interval: u32) -> String {
    let Some(unit) = frequency.unit_label() else {
        return String::new();
    };

    match interval {
        1 => format!("Repeats every {}", unit),
        n if n > 1 => format!("Repeats every {} {}s", n, unit),
        n => format!("Repeats every {} {}", n, unit),
    }
}
