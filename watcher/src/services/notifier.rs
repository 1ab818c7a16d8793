//! Delivery of alert messages to subscribers

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::constants::alerts;

/// Sends a text message to one subscriber
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subscriber_id: i64, text: &str) -> Result<()>;
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationPayload {
    pub subscriber_id: i64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Posts each message as JSON to a webhook that relays it to the subscriber
#[derive(Clone)]
pub struct WebhookNotifier {
    webhook_url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(webhook_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(alerts::WEBHOOK_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client for notifier: {}", e))?;

        Ok(Self {
            webhook_url,
            client,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, subscriber_id: i64, text: &str) -> Result<()> {
        let payload = NotificationPayload {
            subscriber_id,
            text: text.to_string(),
            timestamp: Utc::now(),
        };

        let response = timeout(
            Duration::from_secs(alerts::WEBHOOK_TIMEOUT_SECONDS),
            self.client.post(&self.webhook_url).json(&payload).send(),
        )
        .await
        .map_err(|_| anyhow!("Notification webhook timeout for subscriber {}", subscriber_id))?
        .map_err(|e| anyhow!("Failed to notify subscriber {}: {}", subscriber_id, e))?;

        if !response.status().is_success() {
            warn!(
                "Notification webhook returned status {} for subscriber {}",
                response.status(),
                subscriber_id
            );
            return Err(anyhow!(
                "Notification webhook returned status {}",
                response.status()
            ));
        }

        debug!("Notified subscriber {}", subscriber_id);
        Ok(())
    }
}

/// Writes alerts to the log; used when no webhook is configured
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, subscriber_id: i64, text: &str) -> Result<()> {
        info!("Alert for subscriber {}:\n{}", subscriber_id, text);
        Ok(())
    }
}
