//! Provisioning callback protocol
//!
//! Infrastructure hooks are invoked by the stack-lifecycle service, which
//! waits on an HTTP PUT of a signed response document to the callback URL
//! carried in the event. A hook that never responds hangs the whole stack
//! operation, so both hooks report here on every path, success or failure.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

/// Stack lifecycle phase that triggered the hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// Provisioning event delivered to a lifecycle hook
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionEvent {
    #[serde(rename = "RequestType")]
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    #[serde(rename = "StackId")]
    pub stack_id: String,
    #[serde(rename = "RequestId")]
    pub request_id: String,
    #[serde(rename = "LogicalResourceId")]
    pub logical_resource_id: String,
    #[serde(rename = "PhysicalResourceId", default)]
    pub physical_resource_id: Option<String>,
    #[serde(rename = "ResourceProperties", default)]
    pub resource_properties: serde_json::Value,
}

impl ProvisionEvent {
    /// Deserialize this hook's typed resource properties
    pub fn properties<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.resource_properties.clone())
            .context("Invalid resource properties")
    }

    fn physical_id(&self) -> &str {
        self.physical_resource_id
            .as_deref()
            .unwrap_or(&self.logical_resource_id)
    }
}

/// Hook outcome reported to the lifecycle service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProvisionStatus {
    Success,
    Failed,
}

/// PUT the response document to the event's callback URL
#[instrument(skip(http, event, data), fields(request_id = %event.request_id))]
pub async fn send_response(
    http: &reqwest::Client,
    event: &ProvisionEvent,
    status: ProvisionStatus,
    data: serde_json::Value,
) -> Result<()> {
    let body = json!({
        "Status": status,
        "Reason": format!("See details in Data for request {}", event.request_id),
        "PhysicalResourceId": event.physical_id(),
        "StackId": event.stack_id,
        "RequestId": event.request_id,
        "LogicalResourceId": event.logical_resource_id,
        "Data": data,
    });

    http.put(&event.response_url)
        .json(&body)
        .send()
        .await
        .context("Failed to send provisioning response")?
        .error_for_status()
        .context("Provisioning callback rejected the response")?;

    info!(status = ?status, "Provisioning response sent");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_deserializes_lifecycle_shape() {
        let event: ProvisionEvent = serde_json::from_value(json!({
            "RequestType": "Create",
            "ResponseURL": "https://callback.example/stack",
            "StackId": "arn:aws:cloudformation:stack/flowline",
            "RequestId": "req-1",
            "LogicalResourceId": "FlowlinePrefixes",
            "ResourceProperties": {"the_bucket": "flowline-data"},
        }))
        .unwrap();

        assert_eq!(event.request_type, RequestType::Create);
        assert_eq!(event.physical_id(), "FlowlinePrefixes");
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(ProvisionStatus::Success).unwrap(),
            json!("SUCCESS")
        );
        assert_eq!(
            serde_json::to_value(ProvisionStatus::Failed).unwrap(),
            json!("FAILED")
        );
    }
}
