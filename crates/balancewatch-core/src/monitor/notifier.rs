//! Alert delivery channels

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{NotifierConfig, NotifierKind};
use crate::error::{DeliveryError, Result};

use super::NotificationSink;

/// Human-readable alert text
pub fn format_alert_message(balance: f64, threshold: f64, is_below: bool) -> String {
    let direction = if is_below { "fell below" } else { "rose above" };
    format!("Wallet balance {direction} threshold of {threshold:.2} (current balance: {balance:.2})")
}

/// Build the sink selected in the configuration
pub fn build_notifier(config: &NotifierConfig) -> Result<Arc<dyn NotificationSink>> {
    let timeout = Duration::from_secs(config.timeout_seconds);
    let url = || {
        config
            .url
            .clone()
            .ok_or_else(|| DeliveryError::Config(format!("{:?} notifier needs a url", config.kind)))
    };

    let sink: Arc<dyn NotificationSink> = match config.kind {
        NotifierKind::Log => Arc::new(LogNotifier),
        NotifierKind::Webhook => Arc::new(WebhookNotifier::new(url()?, timeout)?),
        NotifierKind::Slack => Arc::new(SlackNotifier::new(url()?, config.channel.clone(), timeout)?),
    };

    Ok(sink)
}

fn http_client(timeout: Duration) -> std::result::Result<Client, DeliveryError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DeliveryError::Config(format!("failed to create HTTP client: {e}")))
}

async fn check_response(
    channel: &str,
    response: reqwest::Response,
) -> std::result::Result<(), DeliveryError> {
    if response.status().is_success() {
        return Ok(());
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    warn!(channel, status, "Notification rejected");
    Err(DeliveryError::Status { status, body })
}

/// Writes alerts to the log; never fails
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn send_alert(
        &self,
        balance: f64,
        threshold: f64,
        is_below: bool,
    ) -> std::result::Result<(), DeliveryError> {
        warn!(
            balance,
            threshold,
            is_below,
            "{}",
            format_alert_message(balance, threshold, is_below)
        );
        Ok(())
    }
}

/// POSTs a JSON alert to a generic webhook
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    /// Create a webhook notifier
    pub fn new(url: impl Into<String>, timeout: Duration) -> std::result::Result<Self, DeliveryError> {
        Ok(Self {
            client: http_client(timeout)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    async fn send_alert(
        &self,
        balance: f64,
        threshold: f64,
        is_below: bool,
    ) -> std::result::Result<(), DeliveryError> {
        let payload = WebhookPayload {
            event: "balance_threshold_crossed",
            direction: if is_below { "below" } else { "above" },
            balance,
            threshold,
            message: format_alert_message(balance, threshold, is_below),
            triggered_at: Utc::now(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Http(e.to_string()))?;

        check_response("webhook", response).await?;

        info!(url = %self.url, "Webhook notification sent");
        Ok(())
    }
}

/// Posts alerts to a Slack incoming webhook
pub struct SlackNotifier {
    client: Client,
    webhook_url: String,
    channel: Option<String>,
}

impl SlackNotifier {
    /// Create a Slack notifier
    pub fn new(
        webhook_url: impl Into<String>,
        channel: Option<String>,
        timeout: Duration,
    ) -> std::result::Result<Self, DeliveryError> {
        Ok(Self {
            client: http_client(timeout)?,
            webhook_url: webhook_url.into(),
            channel,
        })
    }
}

#[async_trait]
impl NotificationSink for SlackNotifier {
    async fn send_alert(
        &self,
        balance: f64,
        threshold: f64,
        is_below: bool,
    ) -> std::result::Result<(), DeliveryError> {
        let (color, title) = if is_below {
            ("#dc3545", "🔻 Balance below threshold")
        } else {
            ("#17a2b8", "🔺 Balance above threshold")
        };

        let payload = SlackPayload {
            channel: self.channel.clone(),
            username: Some("BalanceWatch".to_string()),
            attachments: vec![SlackAttachment {
                color: color.to_string(),
                title: title.to_string(),
                text: format_alert_message(balance, threshold, is_below),
                fields: vec![
                    SlackField {
                        title: "Balance".to_string(),
                        value: format!("{balance:.2}"),
                        short: true,
                    },
                    SlackField {
                        title: "Threshold".to_string(),
                        value: format!("{threshold:.2}"),
                        short: true,
                    },
                ],
                footer: Some("BalanceWatch".to_string()),
                ts: Some(Utc::now().timestamp()),
            }],
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Http(e.to_string()))?;

        check_response("slack", response).await?;

        info!("Slack notification sent");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload {
    event: &'static str,
    direction: &'static str,
    balance: f64,
    threshold: f64,
    message: String,
    triggered_at: DateTime<Utc>,
}

// Slack payload types
#[derive(Debug, Serialize)]
struct SlackPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Serialize)]
struct SlackAttachment {
    color: String,
    title: String,
    text: String,
    fields: Vec<SlackField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ts: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SlackField {
    title: String,
    value: String,
    short: bool,
}
