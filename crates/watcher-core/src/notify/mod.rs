//! Outbound upgrade notifications.
//!
//! Jobs hand finished [`UpgradeRecord`]s to a [`NotificationSink`]. Delivery is
//! best effort: failures are logged by the caller and never retried within a cycle.

pub mod calendar;
pub mod slack;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::UpgradeRecord;

pub use calendar::{calendar_event_url, upgrade_event_url, CalendarError};
pub use slack::{build_upgrade_message, SlackMessage, SlackNotifier};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotifyError {
    #[error("Notification transport error: {0}")]
    Transport(String),

    #[error("Notification endpoint returned HTTP {0}")]
    Rejected(u16),

    #[error("Invalid notifier configuration: {0}")]
    Configuration(String),
}

/// Destination for upgrade notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Delivers one upgrade notification.
    async fn notify_upgrade(&self, record: &UpgradeRecord) -> Result<(), NotifyError>;
}
