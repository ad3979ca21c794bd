//! Result notification
//!
//! Publishes the final pipeline payload to the configured topic. The
//! payload is forwarded as-is, wrapped in the topic's per-protocol
//! envelope so subscribers receive the raw JSON document.

use anyhow::{Context, Result};
use aws_sdk_sns::Client;
use serde_json::json;
use tracing::{info, instrument};

use crate::config::PipelineConfig;

/// Publishes pipeline outcomes to the notification topic
pub struct Notifier {
    sns: Client,
    topic_arn: String,
}

impl Notifier {
    pub fn new(sns: Client, config: &PipelineConfig) -> Self {
        Self {
            sns,
            topic_arn: config.topic_arn.clone(),
        }
    }

    /// Publish one payload
    #[instrument(skip(self, payload))]
    pub async fn publish(&self, payload: &serde_json::Value) -> Result<String> {
        let envelope = json!({ "default": payload.to_string() });

        let response = self
            .sns
            .publish()
            .target_arn(&self.topic_arn)
            .message(envelope.to_string())
            .message_structure("json")
            .send()
            .await
            .context("Failed to publish notification")?;

        let message_id = response.message_id().unwrap_or_default().to_string();

        info!(topic = %self.topic_arn, message_id = %message_id, "Notification published");

        Ok(message_id)
    }
}
