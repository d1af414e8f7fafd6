use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;

use super::{calendar::upgrade_event_url, NotificationSink, NotifyError};
use crate::{types::UpgradeRecord, utils::format_time_until};

const COLOR_SCHEDULED: &str = "#36a64f";
const COLOR_SOON: &str = "#ffcc00";
const COLOR_IMMINENT: &str = "#ff0000";

/// Slack incoming-webhook payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlackMessage {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlackAttachment {
    pub color: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    pub fields: Vec<SlackField>,
    pub footer: String,
    pub ts: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SlackField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

impl SlackField {
    fn short(title: &str, value: String) -> Self {
        Self { title: title.to_string(), value, short: true }
    }
}

fn title_case(name: &str) -> String {
    name.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn urgency_color(remaining: TimeDelta) -> &'static str {
    if remaining < TimeDelta::hours(1) {
        COLOR_IMMINENT
    } else if remaining < TimeDelta::hours(24) {
        COLOR_SOON
    } else {
        COLOR_SCHEDULED
    }
}

/// Renders the Slack message for an upgrade as seen at `now`.
#[must_use]
pub fn build_upgrade_message(record: &UpgradeRecord, now: DateTime<Utc>) -> SlackMessage {
    let remaining = record.target_time - now;

    let mut fields = vec![
        SlackField::short("Network Type", record.network.to_string()),
        SlackField::short("Height", record.target_height.to_string()),
        SlackField::short(
            "Estimated Time",
            record.target_time.format("%a, %d %b %Y %H:%M:%S UTC").to_string(),
        ),
        SlackField::short("Time Until Upgrade", format_time_until(remaining)),
    ];
    if let Some(folder) = record.cosmovisor_folder.as_deref().filter(|f| !f.is_empty()) {
        fields.push(SlackField::short("Cosmovisor Folder", folder.to_string()));
    }

    let mut links = Vec::new();
    if let Some(proposal) = record.proposal_link.as_deref().filter(|l| !l.is_empty()) {
        links.push(format!("📋 <{proposal}|View Proposal>"));
    }
    if !record.guide.is_empty() {
        links.push(format!("📚 <{}|View Guide>", record.guide));
    }
    if let Some(block) = record.block_explorer_link.as_deref().filter(|l| !l.is_empty()) {
        links.push(format!("🔍 <{block}|View Block>"));
    }
    if let Some(repo) = record.repository.as_deref().filter(|l| !l.is_empty()) {
        links.push(format!("📦 <{repo}|View Code>"));
    }
    match upgrade_event_url(record, now) {
        Ok(url) => links.push(format!("📅 <{url}|Add to Calendar>")),
        Err(e) => tracing::debug!(chain = %record.chain_name, error = %e, "no calendar link"),
    }
    if !links.is_empty() {
        fields.push(SlackField { title: "Links".to_string(), value: links.join(" | "), short: false });
    }

    SlackMessage {
        text: format!(
            "🚀 New Upgrade Scheduled for {}\nUpgrade: {}",
            title_case(&record.chain_name),
            record.version_label
        ),
        attachments: vec![SlackAttachment {
            color: urgency_color(remaining).to_string(),
            text: record.info.clone(),
            fields,
            footer: format!(
                "Chain: {} | Last Updated: {}",
                record.chain_name,
                now.format("%a, %d %b %Y %H:%M:%S UTC")
            ),
            ts: now.timestamp(),
        }],
    }
}

/// Posts upgrade notifications to a Slack incoming webhook.
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackNotifier {
    /// # Errors
    ///
    /// Returns [`NotifyError::Configuration`] for an empty webhook or if the HTTP client
    /// cannot be built.
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, NotifyError> {
        let webhook_url = webhook_url.into();
        if webhook_url.trim().is_empty() {
            return Err(NotifyError::Configuration("Slack webhook URL is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Configuration(e.to_string()))?;
        Ok(Self { client, webhook_url })
    }

    /// Sends an arbitrary message to the webhook.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Transport`] on network failure and
    /// [`NotifyError::Rejected`] for any status other than 200.
    pub async fn send(&self, message: &SlackMessage) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(message)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn notify_upgrade(&self, record: &UpgradeRecord) -> Result<(), NotifyError> {
        let message = build_upgrade_message(record, Utc::now());
        self.send(&message).await?;
        tracing::info!(chain = %record.chain_name, upgrade = %record.upgrade_name, "slack notification sent");
        Ok(())
    }
}
