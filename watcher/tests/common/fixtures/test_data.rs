//! Common test data and a capturing notifier

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use watcher::database::WatchRecord;
use watcher::health::HealthAssessment;
use watcher::services::Notifier;

pub mod subscribers {
    pub const ALICE: i64 = 1001;
    pub const BOB: i64 = 1002;
}

pub mod hosts {
    pub const NODE_1: &str = "10.0.0.1";
    pub const NODE_2: &str = "10.0.0.2";
    pub const NODE_3: &str = "node-3.example.com";
}

/// Record evaluated at `at` with the given errors (healthy when empty)
pub fn evaluated_record(
    subscriber_id: i64,
    host: &str,
    errors: &[&str],
    at: DateTime<Utc>,
) -> WatchRecord {
    let mut record = WatchRecord::new(subscriber_id, host);
    let assessment =
        HealthAssessment::from_errors(errors.iter().map(|e| e.to_string()).collect());
    record.apply_assessment(&assessment, at);
    record
}

pub fn unhealthy_record(subscriber_id: i64, host: &str, errors: &[&str]) -> WatchRecord {
    evaluated_record(subscriber_id, host, errors, Utc::now())
}

pub fn healthy_record(subscriber_id: i64, host: &str) -> WatchRecord {
    evaluated_record(subscriber_id, host, &[], Utc::now())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub subscriber_id: i64,
    pub text: String,
}

/// Notifier that records messages and can be switched to fail
#[derive(Default)]
pub struct CapturingNotifier {
    sent: Mutex<Vec<SentMessage>>,
    failing: AtomicBool,
}

impl CapturingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn notify(&self, subscriber_id: i64, text: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("notifier unavailable"));
        }
        self.sent.lock().await.push(SentMessage {
            subscriber_id,
            text: text.to_string(),
        });
        Ok(())
    }
}
