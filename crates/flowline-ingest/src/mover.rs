//! File mover
//!
//! Routes a file to the archive or error prefix based on the upstream
//! task's status, then deletes the original. Copy-then-delete is not
//! atomic: a retry after a partial failure can leave a duplicate object,
//! so downstream consumers must tolerate at-least-once delivery.

use anyhow::Result;
use flowline_common::types::{MoveRequest, MoveResult, Validation};
use tracing::{info, instrument};

use crate::config::PipelineConfig;
use crate::storage::{object_key, ObjectStore};

/// Moves files between pipeline prefixes
pub struct FileMover {
    store: ObjectStore,
    stage_location: String,
    archive_location: String,
    error_location: String,
}

impl FileMover {
    pub fn new(store: ObjectStore, config: &PipelineConfig) -> Self {
        Self {
            store,
            stage_location: config.locations.stage.clone(),
            archive_location: config.locations.archive.clone(),
            error_location: config.locations.error.clone(),
        }
    }

    /// Move one file according to the upstream task result
    ///
    /// When the engine's error-catch path fires there is no task result;
    /// the file is then assumed staged and routed to the error prefix.
    #[instrument(skip(self), fields(bucket = %request.bucket_name, file = %request.file_name))]
    pub async fn run(&self, request: &MoveRequest) -> Result<MoveResult> {
        // An error-catch payload wins over any task result: the file is
        // assumed staged and the move is a failure routing.
        let (source_location, status) = match (&request.error_info, &request.taskresult) {
            (Some(_), _) | (None, None) => (self.stage_location.as_str(), Validation::Failure),
            (None, Some(task)) => (task.location.as_str(), task.validation),
        };

        let dest_location = match status {
            Validation::Failure => {
                info!("Status is FAILURE, moving to error prefix");
                self.error_location.as_str()
            }
            _ => {
                info!("Status is SUCCESS, moving to archive prefix");
                self.archive_location.as_str()
            }
        };

        let source_key = object_key(source_location, &request.file_name);
        let dest_key = object_key(dest_location, &request.file_name);

        self.store
            .copy(&request.bucket_name, &source_key, &dest_key)
            .await?;
        self.store.delete(&request.bucket_name, &source_key).await?;

        info!(dest = %dest_key, "File moved");

        Ok(MoveResult {
            status,
            msg: format!("File moved to {}", dest_key),
        })
    }
}
