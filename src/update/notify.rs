//! Best-effort webhook notifications.

use crate::config::StewardConfig;
use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
}

/// Posts `{"content": ...}` to the configured webhook.
///
/// Delivery is attempted once. Failures are logged and swallowed.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    target: Option<(reqwest::Client, String)>,
}

impl Notifier {
    /// A notifier that never sends anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn new(webhook_url: Option<String>, timeout: Duration) -> Result<Self> {
        let Some(url) = webhook_url else {
            return Ok(Self::disabled());
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build webhook HTTP client")?;

        Ok(Self {
            target: Some((client, url)),
        })
    }

    pub fn from_config(config: &StewardConfig) -> Result<Self> {
        Self::new(config.webhook_url.clone(), config.request_timeout())
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    pub async fn send(&self, content: &str) {
        let Some((client, url)) = &self.target else {
            return;
        };

        match client.post(url).json(&WebhookMessage { content }).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Webhook notification delivered");
            }
            Ok(response) => {
                warn!("Webhook rejected notification: HTTP {}", response.status());
            }
            Err(e) => {
                warn!("Failed to deliver webhook notification: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_notifier_is_silent() {
        let notifier = Notifier::new(None, Duration::from_secs(1)).unwrap();
        assert!(!notifier.is_enabled());
        notifier.send("ignored").await;
    }

    #[tokio::test]
    async fn test_unreachable_webhook_does_not_propagate() {
        let notifier =
            Notifier::new(Some("http://127.0.0.1:9/hook".into()), Duration::from_secs(1)).unwrap();
        assert!(notifier.is_enabled());
        notifier.send("update starting").await;
    }

    #[test]
    fn test_message_shape() {
        let body = serde_json::to_string(&WebhookMessage { content: "hi" }).unwrap();
        assert_eq!(body, r#"{"content":"hi"}"#);
    }
}
