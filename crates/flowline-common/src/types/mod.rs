//! Payload types shared across Flowline handlers
//!
//! These are the wire contracts exchanged with the external workflow
//! engine. Field names are case-sensitive and must not change: the engine
//! branches on them (`$.taskresult.Validation` and friends).

use serde::{Deserialize, Serialize};

/// Outcome flag carried through every pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Validation {
    Success,
    Failure,
    Running,
}

impl Validation {
    pub fn as_str(&self) -> &str {
        match self {
            Validation::Success => "SUCCESS",
            Validation::Failure => "FAILURE",
            Validation::Running => "RUNNING",
        }
    }
}

impl std::fmt::Display for Validation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to validate one source object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub bucket_name: String,
    pub key_name: String,
    pub file_name: String,
}

/// Result of a Validator invocation
///
/// Produced once per invocation and never mutated after return. `location`
/// is the destination tag the file is routed to: the success prefix when
/// the transformed copy was written, the failure prefix otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(rename = "Validation")]
    pub validation: Validation,
    #[serde(rename = "Reason", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "Location")]
    pub location: String,
}

impl ValidationResult {
    pub fn success(location: impl Into<String>) -> Self {
        Self {
            validation: Validation::Success,
            reason: None,
            location: location.into(),
        }
    }

    pub fn failure(reason: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            validation: Validation::Failure,
            reason: Some(reason.into()),
            location: location.into(),
        }
    }
}

/// Request to check a catalog crawler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerRequest {
    pub crawler_name: String,
    /// Attempt counter, accumulated across workflow retries
    #[serde(default)]
    pub cnt: u32,
}

/// Status snapshot returned by the crawler poller
///
/// The workflow engine re-invokes the poller until `Validation` leaves
/// `RUNNING`; `cnt` comes back incremented so the engine can pass it
/// straight into the next attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerStatus {
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Validation")]
    pub validation: Validation,
    pub crawler_name: String,
    pub running_time: i64,
    pub cnt: u32,
    pub last_crawl_status: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Acknowledgement returned by the crawler starter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerStarted {
    pub crawler_name: String,
}

/// Result of an upstream task, as forwarded by the workflow engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    #[serde(rename = "Validation")]
    pub validation: Validation,
    #[serde(rename = "Location")]
    pub location: String,
}

/// Request to move a file between prefixes
///
/// When the engine's error-catch path fires, `taskresult` is absent and
/// `error-info` carries the failure detail instead; the mover then treats
/// the stage prefix as the source and the status as `FAILURE`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    pub bucket_name: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taskresult: Option<TaskResult>,
    #[serde(
        rename = "error-info",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub error_info: Option<serde_json::Value>,
}

/// Result of a file move
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResult {
    #[serde(rename = "Status")]
    pub status: Validation,
    pub msg: String,
}

/// Normalized input handed to a new workflow execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInput {
    pub bucket_name: String,
    pub bucket_arn: String,
    pub key_name: String,
    pub file_name: String,
}

/// Object-storage event notification (the subset the trigger consumes)
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectEvent {
    #[serde(rename = "Records")]
    pub records: Vec<ObjectEventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectEventRecord {
    pub s3: ObjectEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectEntity {
    pub bucket: EventBucket,
    pub object: EventObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventBucket {
    pub name: String,
    pub arn: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventObject {
    pub key: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_wire_names() {
        assert_eq!(
            serde_json::to_value(Validation::Success).unwrap(),
            json!("SUCCESS")
        );
        assert_eq!(
            serde_json::to_value(Validation::Failure).unwrap(),
            json!("FAILURE")
        );
        assert_eq!(
            serde_json::to_value(Validation::Running).unwrap(),
            json!("RUNNING")
        );
    }

    #[test]
    fn test_validation_result_serializes_exact_field_names() {
        let result = ValidationResult::failure("no record found", "error");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "Validation": "FAILURE",
                "Reason": "no record found",
                "Location": "error",
            })
        );
    }

    #[test]
    fn test_validation_result_success_omits_reason() {
        let value = serde_json::to_value(ValidationResult::success("stage")).unwrap();
        assert!(value.get("Reason").is_none());
        assert_eq!(value["Validation"], "SUCCESS");
    }

    #[test]
    fn test_crawler_request_defaults_counter() {
        let req: CrawlerRequest =
            serde_json::from_value(json!({"crawler_name": "flowline-crawler"})).unwrap();
        assert_eq!(req.cnt, 0);
    }

    #[test]
    fn test_move_request_error_info_path() {
        let req: MoveRequest = serde_json::from_value(json!({
            "bucket_name": "flowline-data",
            "file_name": "sales.csv",
            "error-info": {"Error": "States.TaskFailed"},
        }))
        .unwrap();
        assert!(req.taskresult.is_none());
        assert!(req.error_info.is_some());
    }

    #[test]
    fn test_move_request_taskresult_path() {
        let req: MoveRequest = serde_json::from_value(json!({
            "bucket_name": "flowline-data",
            "file_name": "sales.csv",
            "taskresult": {"Validation": "SUCCESS", "Location": "stage"},
        }))
        .unwrap();
        let task = req.taskresult.unwrap();
        assert_eq!(task.validation, Validation::Success);
        assert_eq!(task.location, "stage");
    }

    #[test]
    fn test_object_event_deserializes_notification_shape() {
        let event: ObjectEvent = serde_json::from_value(json!({
            "Records": [{
                "s3": {
                    "bucket": {
                        "name": "flowline-data",
                        "arn": "arn:aws:s3:::flowline-data",
                    },
                    "object": {"key": "raw/sales.csv"},
                }
            }]
        }))
        .unwrap();
        assert_eq!(event.records[0].s3.object.key, "raw/sales.csv");
    }
}
