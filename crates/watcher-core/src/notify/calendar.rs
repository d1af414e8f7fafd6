//! "Add to calendar" links for upcoming upgrades.

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use url::Url;

use crate::types::UpgradeRecord;

const CALENDAR_ENDPOINT: &str = "https://calendar.google.com/calendar/render";
const EVENT_LOCATION: &str = "Cosmos Network";
const DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CalendarError {
    #[error("Event title cannot be empty")]
    EmptyTitle,

    #[error("Event end must be after its start")]
    InvalidRange,

    #[error("Event start is in the past")]
    StartInPast,

    #[error("Failed to build calendar URL: {0}")]
    Url(String),
}

/// Builds a Google Calendar template URL for an event.
///
/// # Errors
///
/// Rejects an empty title, an end that is not after the start, and a start before `now`.
pub fn calendar_event_url(
    title: &str,
    details: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<String, CalendarError> {
    if title.trim().is_empty() {
        return Err(CalendarError::EmptyTitle);
    }
    if end <= start {
        return Err(CalendarError::InvalidRange);
    }
    if start < now {
        return Err(CalendarError::StartInPast);
    }

    let dates = format!("{}/{}", start.format(DATE_FORMAT), end.format(DATE_FORMAT));
    let url = Url::parse_with_params(
        CALENDAR_ENDPOINT,
        &[
            ("action", "TEMPLATE"),
            ("text", title),
            ("details", details),
            ("dates", dates.as_str()),
            ("location", EVENT_LOCATION),
        ],
    )
    .map_err(|e| CalendarError::Url(e.to_string()))?;

    Ok(url.into())
}

/// Builds a one-hour calendar event for an upgrade.
///
/// # Errors
///
/// Returns [`CalendarError::StartInPast`] for upgrades that are already due.
pub fn upgrade_event_url(record: &UpgradeRecord, now: DateTime<Utc>) -> Result<String, CalendarError> {
    let title = format!("{} Network Upgrade", record.chain_name);
    let details = format!(
        "Chain: {}\nUpgrade Name: {}\nUpgrade Height: {}\nInfo: {}\nEstimated: {}",
        record.chain_name, record.upgrade_name, record.target_height, record.info, record.estimated
    );
    calendar_event_url(
        &title,
        &details,
        record.target_time,
        record.target_time + TimeDelta::hours(1),
        now,
    )
}
