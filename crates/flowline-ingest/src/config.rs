//! Pipeline configuration
//!
//! All environment-sourced settings live here. The bootstrap layer loads
//! this once per cold start and passes it into each handler at
//! construction; handlers themselves never read the environment.

use flowline_common::FlowlineError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Pipeline Configuration Constants
// ============================================================================

/// Default prefix where new files arrive.
pub const DEFAULT_SOURCE_PREFIX: &str = "raw";

/// Default prefix for validated, transformed files.
pub const DEFAULT_STAGE_PREFIX: &str = "stage";

/// Default prefix for files that completed the pipeline.
pub const DEFAULT_ARCHIVE_PREFIX: &str = "archive";

/// Default prefix for files that failed validation or crawling.
pub const DEFAULT_ERROR_PREFIX: &str = "error";

/// Default ceiling on crawler poll attempts.
pub const DEFAULT_RETRY_LIMIT: u32 = 10;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Bucket holding every pipeline prefix
    pub bucket: String,
    /// Location tags mapped to storage prefixes
    pub locations: LocationConfig,
    /// JSON-encoded field schema for the Validator
    pub schema_json: String,
    /// Ceiling on crawler poll attempts before RETRYLIMITREACH
    pub retry_limit: u32,
    /// Catalog crawler driven by the pipeline
    pub crawler_name: String,
    /// Notification topic ARN
    pub topic_arn: String,
    /// Workflow state machine ARN started on file arrival
    pub state_machine_arn: String,
    /// Build project run by the provisioning hook
    pub build_project: String,
}

/// Location tags for each pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    pub source: String,
    pub stage: String,
    pub archive: String,
    pub error: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE_PREFIX.to_string(),
            stage: DEFAULT_STAGE_PREFIX.to_string(),
            archive: DEFAULT_ARCHIVE_PREFIX.to_string(),
            error: DEFAULT_ERROR_PREFIX.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables
    ///
    /// - `FLOWLINE_BUCKET`: pipeline bucket name
    /// - `FLOWLINE_SOURCE_PREFIX` / `FLOWLINE_STAGE_PREFIX` /
    ///   `FLOWLINE_ARCHIVE_PREFIX` / `FLOWLINE_ERROR_PREFIX`: location tags
    /// - `FLOWLINE_SCHEMA`: JSON-encoded field schema
    /// - `FLOWLINE_RETRY_LIMIT`: crawler poll ceiling
    /// - `FLOWLINE_CRAWLER_NAME`: catalog crawler name
    /// - `FLOWLINE_TOPIC_ARN`: notification topic
    /// - `FLOWLINE_STATE_MACHINE_ARN`: workflow to start on file arrival
    /// - `FLOWLINE_BUILD_PROJECT`: build project for the provisioning hook
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            bucket: std::env::var("FLOWLINE_BUCKET").unwrap_or_default(),
            locations: LocationConfig {
                source: std::env::var("FLOWLINE_SOURCE_PREFIX")
                    .unwrap_or_else(|_| DEFAULT_SOURCE_PREFIX.to_string()),
                stage: std::env::var("FLOWLINE_STAGE_PREFIX")
                    .unwrap_or_else(|_| DEFAULT_STAGE_PREFIX.to_string()),
                archive: std::env::var("FLOWLINE_ARCHIVE_PREFIX")
                    .unwrap_or_else(|_| DEFAULT_ARCHIVE_PREFIX.to_string()),
                error: std::env::var("FLOWLINE_ERROR_PREFIX")
                    .unwrap_or_else(|_| DEFAULT_ERROR_PREFIX.to_string()),
            },
            schema_json: std::env::var("FLOWLINE_SCHEMA").unwrap_or_else(|_| "{}".to_string()),
            retry_limit: std::env::var("FLOWLINE_RETRY_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_LIMIT),
            crawler_name: std::env::var("FLOWLINE_CRAWLER_NAME").unwrap_or_default(),
            topic_arn: std::env::var("FLOWLINE_TOPIC_ARN").unwrap_or_default(),
            state_machine_arn: std::env::var("FLOWLINE_STATE_MACHINE_ARN").unwrap_or_default(),
            build_project: std::env::var("FLOWLINE_BUILD_PROJECT").unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bucket.is_empty() {
            anyhow::bail!("FLOWLINE_BUCKET cannot be empty");
        }

        if self.retry_limit == 0 {
            anyhow::bail!("FLOWLINE_RETRY_LIMIT must be greater than 0");
        }

        for (name, tag) in [
            ("source", &self.locations.source),
            ("stage", &self.locations.stage),
            ("archive", &self.locations.archive),
            ("error", &self.locations.error),
        ] {
            if tag.is_empty() {
                anyhow::bail!("Location tag '{}' cannot be empty", name);
            }
            if tag.contains('/') {
                anyhow::bail!("Location tag '{}' must be a bare prefix, got: {}", name, tag);
            }
        }

        serde_json::from_str::<serde_json::Value>(&self.schema_json)
            .map_err(|e| FlowlineError::Config(format!("FLOWLINE_SCHEMA is not valid JSON: {e}")))?;

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bucket: "flowline-data".to_string(),
            locations: LocationConfig::default(),
            schema_json: "{}".to_string(),
            retry_limit: DEFAULT_RETRY_LIMIT,
            crawler_name: String::new(),
            topic_arn: String::new(),
            state_machine_arn: String::new(),
            build_project: String::new(),
        }
    }
}
