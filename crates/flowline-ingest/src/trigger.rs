//! Workflow trigger
//!
//! Fires on object-created notifications: normalizes the event into the
//! workflow input payload and starts one execution of the pipeline state
//! machine.

use anyhow::{Context, Result};
use aws_sdk_sfn::Client;
use flowline_common::types::{ObjectEvent, WorkflowInput};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::PipelineConfig;

/// Starts a workflow execution for each arriving file
pub struct WorkflowTrigger {
    sfn: Client,
    state_machine_arn: String,
}

impl WorkflowTrigger {
    pub fn new(sfn: Client, config: &PipelineConfig) -> Self {
        Self {
            sfn,
            state_machine_arn: config.state_machine_arn.clone(),
        }
    }

    /// Start one execution for the first record of the notification
    #[instrument(skip(self, event))]
    pub async fn run(&self, event: &ObjectEvent) -> Result<String> {
        let input = workflow_input(event)?;

        info!(
            bucket = %input.bucket_name,
            key = %input.key_name,
            "Starting workflow execution"
        );

        let response = self
            .sfn
            .start_execution()
            .state_machine_arn(&self.state_machine_arn)
            // Execution names must be unique per state machine; object keys
            // are not valid name characters, so use a fresh id.
            .name(Uuid::new_v4().to_string())
            .input(serde_json::to_string(&input)?)
            .send()
            .await
            .context("Failed to start workflow execution")?;

        let execution_arn = response.execution_arn().to_string();

        info!(execution = %execution_arn, "Workflow execution started");

        Ok(execution_arn)
    }
}

/// Normalize an object-created notification into the workflow input
pub fn workflow_input(event: &ObjectEvent) -> Result<WorkflowInput> {
    let record = event
        .records
        .first()
        .context("Notification contains no records")?;

    let key_name = record.s3.object.key.clone();
    let file_name = key_name
        .rsplit('/')
        .next()
        .unwrap_or(key_name.as_str())
        .to_string();

    Ok(WorkflowInput {
        bucket_name: record.s3.bucket.name.clone(),
        bucket_arn: record.s3.bucket.arn.clone(),
        key_name,
        file_name,
    })
}
