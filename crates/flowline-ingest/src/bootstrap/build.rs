//! Build-and-wait provisioning hook
//!
//! Runs the configured build project when provisioning asks for it and
//! blocks until the build reaches a terminal state. Polling here is the
//! one place the pipeline sleeps in-process: the lifecycle service gives
//! hooks a single synchronous window, so the retry cadence cannot be
//! delegated to the workflow engine.

use anyhow::{Context, Result};
use aws_sdk_codebuild::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::config::PipelineConfig;

use super::provision::{send_response, ProvisionEvent, ProvisionStatus, RequestType};

/// Maximum status polls before giving up on a build
const MAX_POLL_ATTEMPTS: u32 = 50;

/// Delay between status polls
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Settle delay after a successful build; published artifacts are not
/// immediately visible to consumers.
const SETTLE_DELAY: Duration = Duration::from_secs(15);

/// Resource properties for the build hook
#[derive(Debug, Clone, Deserialize)]
pub struct BuildProperties {
    /// "yes" requests a rebuild; anything else skips it
    #[serde(rename = "Update_lambda_layer", default)]
    pub update_layer: String,
}

/// Starts the build project and waits for its terminal status
pub struct BuildRunner {
    codebuild: Client,
    project_name: String,
    http: reqwest::Client,
}

impl BuildRunner {
    pub fn new(codebuild: Client, http: reqwest::Client, config: &PipelineConfig) -> Self {
        Self {
            codebuild,
            project_name: config.build_project.clone(),
            http,
        }
    }

    /// Handle one provisioning event, always reporting to the callback
    #[instrument(skip(self, event), fields(request = ?event.request_type, project = %self.project_name))]
    pub async fn run(&self, event: &ProvisionEvent) -> Result<()> {
        if !matches!(
            event.request_type,
            RequestType::Create | RequestType::Update
        ) {
            return send_response(&self.http, event, ProvisionStatus::Success, json!({})).await;
        }

        let props: BuildProperties = match event.properties() {
            Ok(props) => props,
            Err(e) => {
                error!(error = %e, "Invalid build hook properties");
                return send_response(
                    &self.http,
                    event,
                    ProvisionStatus::Failed,
                    json!({ "Data": e.to_string() }),
                )
                .await;
            }
        };

        if props.update_layer != "yes" {
            info!("Build not requested");
            return send_response(
                &self.http,
                event,
                ProvisionStatus::Success,
                json!({ "Data": "No update needed" }),
            )
            .await;
        }

        match self.build_and_wait().await {
            Ok(()) => {
                // Allow the published artifact to propagate before the
                // stack moves on to resources that consume it.
                sleep(SETTLE_DELAY).await;
                send_response(&self.http, event, ProvisionStatus::Success, json!({})).await
            }
            Err(e) => {
                error!(error = %e, "Build failed");
                send_response(
                    &self.http,
                    event,
                    ProvisionStatus::Failed,
                    json!({ "Data": e.to_string() }),
                )
                .await
            }
        }
    }

    async fn build_and_wait(&self) -> Result<()> {
        info!("Starting build");

        let started = self
            .codebuild
            .start_build()
            .project_name(&self.project_name)
            .send()
            .await
            .context("Failed to start build")?;

        let build_id = started
            .build_value()
            .and_then(|b| b.id())
            .context("Build id missing from start response")?
            .to_string();

        info!(build_id = %build_id, "Build started, polling for completion");

        for attempt in 1..=MAX_POLL_ATTEMPTS {
            sleep(POLL_INTERVAL).await;

            let response = self
                .codebuild
                .batch_get_builds()
                .ids(&build_id)
                .send()
                .await
                .context("Failed to get build status")?;

            let status = response
                .builds()
                .first()
                .and_then(|b| b.build_status())
                .map(|s| s.as_str().to_string())
                .unwrap_or_default();

            info!(attempt, status = %status, "Build status");

            match status.as_str() {
                "SUCCEEDED" => {
                    info!(build_id = %build_id, "Build succeeded");
                    return Ok(());
                }
                "FAILED" | "FAULT" | "STOPPED" | "TIMED_OUT" => {
                    anyhow::bail!("Build {} finished with status {}", build_id, status);
                }
                _ => {}
            }
        }

        warn!(build_id = %build_id, "Build did not finish within the poll budget");
        anyhow::bail!(
            "Build {} still running after {} polls",
            build_id,
            MAX_POLL_ATTEMPTS
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_properties_flag() {
        let props: BuildProperties =
            serde_json::from_value(json!({"Update_lambda_layer": "yes"})).unwrap();
        assert_eq!(props.update_layer, "yes");

        let props: BuildProperties = serde_json::from_value(json!({})).unwrap();
        assert_ne!(props.update_layer, "yes");
    }
}
