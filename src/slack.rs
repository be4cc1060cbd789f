use std::time::Duration;

use async_trait::async_trait;
use gradwatch_core::contract::{ContractError, NoopNotifier, Notifier};
use serde_json::json;

const TIMEOUT: Duration = Duration::from_secs(10);

/// Posts `{"text": ...}` to an incoming-webhook URL (Slack compatible).
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Result<Self, ContractError> {
        let client = reqwest::Client::builder().timeout(TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, text: &str) -> Result<(), ContractError> {
        self.client
            .post(&self.url)
            .json(&json!({ "text": text }))
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!("Webhook notification delivered");
        Ok(())
    }
}

/// Webhook notifier when a URL is configured, otherwise a no-op.
pub fn select_notifier(webhook_url: Option<&str>) -> Result<Box<dyn Notifier>, ContractError> {
    match webhook_url {
        Some(url) => {
            tracing::info!("Webhook notifications enabled");
            Ok(Box::new(WebhookNotifier::new(url)?))
        }
        None => {
            tracing::info!("No webhook configured, notifications disabled");
            Ok(Box::new(NoopNotifier))
        }
    }
}
