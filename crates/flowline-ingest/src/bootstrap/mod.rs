//! Infrastructure bootstrap hooks
//!
//! One-time handlers invoked only during stack provisioning: prefix and
//! seed-object creation (with full-bucket teardown on delete) and the
//! build-and-wait hook. Both report their outcome to the provisioning
//! callback rather than returning it to a workflow.

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, instrument};

use crate::storage::ObjectStore;

pub mod build;
pub mod provision;

use provision::{send_response, ProvisionEvent, ProvisionStatus, RequestType};

/// Resource properties for the prefix bootstrap hook
#[derive(Debug, Clone, Deserialize)]
pub struct PrefixProperties {
    pub the_bucket: String,
    #[serde(default)]
    pub dirs_to_create: Vec<String>,
    #[serde(default)]
    pub file_content: String,
    #[serde(default)]
    pub file_prefix: String,
}

/// Creates the pipeline's prefixes and seed object at provisioning time
pub struct PrefixBootstrap {
    store: ObjectStore,
    http: reqwest::Client,
}

impl PrefixBootstrap {
    pub fn new(store: ObjectStore, http: reqwest::Client) -> Self {
        Self { store, http }
    }

    /// Handle one provisioning event, always reporting to the callback
    #[instrument(skip(self, event), fields(request = ?event.request_type))]
    pub async fn run(&self, event: &ProvisionEvent) -> Result<()> {
        match self.apply(event).await {
            Ok(()) => send_response(&self.http, event, ProvisionStatus::Success, json!({})).await,
            Err(e) => {
                error!(error = %e, "Prefix bootstrap failed");
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

    async fn apply(&self, event: &ProvisionEvent) -> Result<()> {
        let props: PrefixProperties = event.properties()?;

        match event.request_type {
            RequestType::Create | RequestType::Update => {
                info!(bucket = %props.the_bucket, prefixes = ?props.dirs_to_create, "Creating prefixes");

                for prefix in &props.dirs_to_create {
                    self.store.create_prefix(&props.the_bucket, prefix).await?;
                }

                if !props.file_prefix.is_empty() {
                    self.store
                        .upload(
                            &props.the_bucket,
                            &props.file_prefix,
                            props.file_content.clone().into_bytes(),
                        )
                        .await?;
                    info!(key = %props.file_prefix, "Seed object created");
                }
            }
            RequestType::Delete => {
                info!(bucket = %props.the_bucket, "Tearing down bucket contents");
                self.store.purge(&props.the_bucket).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_properties_defaults() {
        let props: PrefixProperties =
            serde_json::from_value(json!({"the_bucket": "flowline-data"})).unwrap();
        assert!(props.dirs_to_create.is_empty());
        assert!(props.file_prefix.is_empty());
    }

    #[test]
    fn test_prefix_properties_full_shape() {
        let props: PrefixProperties = serde_json::from_value(json!({
            "the_bucket": "flowline-data",
            "dirs_to_create": ["raw", "stage", "archive", "error"],
            "file_content": "placeholder",
            "file_prefix": "raw/.keep",
        }))
        .unwrap();
        assert_eq!(props.dirs_to_create.len(), 4);
        assert_eq!(props.file_prefix, "raw/.keep");
    }
}
