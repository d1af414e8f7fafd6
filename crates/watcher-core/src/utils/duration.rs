use chrono::TimeDelta;

/// Formats the time remaining until an upgrade.
///
/// Negative durations render as `Past due`. Otherwise the two most significant units
/// are shown, e.g. `2 days, 3 hours` or `5 hours, 12 minutes`.
#[must_use]
pub fn format_time_until(remaining: TimeDelta) -> String {
    if remaining < TimeDelta::zero() {
        return "Past due".to_string();
    }

    let days = remaining.num_days();
    let hours = remaining.num_hours() % 24;
    let minutes = remaining.num_minutes() % 60;

    if days > 0 {
        format!("{days} days, {hours} hours")
    } else if hours > 0 {
        format!("{hours} hours, {minutes} minutes")
    } else {
        format!("{minutes} minutes")
    }
}
