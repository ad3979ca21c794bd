//! Record validation and transform
//!
//! The one pipeline step with real branching: parse the source table,
//! validate every record against the configured schema, derive the date
//! parts, and either stage the transformed copy or report why not. All
//! failures are recovered into the returned payload; the workflow engine
//! branches on it, so nothing here is allowed to become a fatal error.

use anyhow::Result;
use flowline_common::types::{ValidationRequest, ValidationResult};
use flowline_common::FlowlineError;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::schema::{self, Schema};
use crate::storage::{object_key, ObjectStore};
use crate::table::Table;

/// Field the derived `Month`/`Day`/`Year` columns are extracted from
pub const DATE_FIELD: &str = "Date";

/// Validates raw files and stages their transformed copies
pub struct Validator {
    store: ObjectStore,
    schema: Schema,
    stage_location: String,
    error_location: String,
}

impl Validator {
    /// Build a Validator from the pipeline configuration
    ///
    /// The schema is parsed once here; a malformed schema is a
    /// configuration error, not a per-file validation failure.
    pub fn new(store: ObjectStore, config: &PipelineConfig) -> Result<Self> {
        let schema = Schema::from_json(&config.schema_json)?;

        Ok(Self {
            store,
            schema,
            stage_location: config.locations.stage.clone(),
            error_location: config.locations.error.clone(),
        })
    }

    /// Validate one source object and stage its transformed copy
    ///
    /// On success the augmented table is written under the stage prefix and
    /// the original object is deleted. On any failure the source is left in
    /// place and the result names the failure location.
    pub async fn run(&self, request: &ValidationRequest) -> Result<ValidationResult> {
        info!(
            bucket = %request.bucket_name,
            key = %request.key_name,
            "Validating source object"
        );

        let data = match self
            .store
            .download(&request.bucket_name, &request.key_name)
            .await
        {
            Ok(data) => data,
            Err(e) => {
                warn!(key = %request.key_name, error = %e, "Failed to read source object");
                return Ok(self.failure("error reading source"));
            }
        };

        let table = match validate_and_transform(&data, &self.schema) {
            Ok(table) => table,
            Err(e) => {
                warn!(key = %request.key_name, reason = %e, "Validation failed");
                return Ok(self.failure(reason_for(&e)));
            }
        };

        let staged_key = object_key(&self.stage_location, &request.file_name);
        let output = match table.to_csv() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %request.key_name, error = %e, "Failed to serialize staged table");
                return Ok(self.failure("error reading source"));
            }
        };

        self.store
            .upload(&request.bucket_name, &staged_key, output)
            .await?;
        self.store
            .delete(&request.bucket_name, &request.key_name)
            .await?;

        info!(
            bucket = %request.bucket_name,
            staged_key = %staged_key,
            rows = table.row_count(),
            "Staged transformed file"
        );

        Ok(ValidationResult::success(self.stage_location.clone()))
    }

    fn failure(&self, reason: impl Into<String>) -> ValidationResult {
        ValidationResult::failure(reason, self.error_location.clone())
    }
}

/// Pure validation-and-transform core
///
/// Parses the bytes as a CSV table, validates records in row order
/// (stopping at the first invalid record), and returns the table with the
/// derived date-part columns appended.
pub fn validate_and_transform(data: &[u8], schema: &Schema) -> Result<Table, FlowlineError> {
    let mut table = Table::from_csv(data)?;

    if table.is_empty() {
        return Err(FlowlineError::EmptyInput);
    }

    for (idx, record) in table.records().enumerate() {
        let violations = schema::validate_record(schema, record);
        if !violations.is_empty() {
            return Err(schema::record_failure(idx, &violations));
        }
    }

    table.add_date_parts(DATE_FIELD)?;

    Ok(table)
}

fn reason_for(error: &FlowlineError) -> String {
    match error {
        FlowlineError::Parse(_) => "error reading source".to_string(),
        FlowlineError::EmptyInput => "no record found".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales_schema() -> Schema {
        Schema::from_json(
            r#"{
                "Date": {"type": "string", "required": true, "format": "%m/%d/%Y"},
                "Amount": {"type": "integer", "required": true},
                "Region": {"type": "string", "required": true}
            }"#,
        )
        .unwrap()
    }

    const VALID_CSV: &str = "\
Date,Amount,Region
01/15/2023,120,north
02/28/2023,75,south
03/01/2023,12,east
";

    #[test]
    fn test_valid_table_gains_derived_columns() {
        let table = validate_and_transform(VALID_CSV.as_bytes(), &sales_schema()).unwrap();
        assert_eq!(
            table.headers(),
            ["Date", "Amount", "Region", "Month", "Day", "Year"]
        );

        let first: Vec<(&str, &str)> = table.records().next().unwrap().collect();
        assert_eq!(first[3], ("Month", "01"));
        assert_eq!(first[4], ("Day", "15"));
        assert_eq!(first[5], ("Year", "2023"));
    }

    #[test]
    fn test_empty_table_is_no_record_found() {
        let err = validate_and_transform(b"Date,Amount,Region\n", &sales_schema()).unwrap_err();
        assert!(matches!(err, FlowlineError::EmptyInput));
        assert_eq!(reason_for(&err), "no record found");
    }

    #[test]
    fn test_first_bad_row_short_circuits_with_index() {
        let csv = "\
Date,Amount,Region
01/15/2023,120,north
02/28/2023,75,south
03/01/2023,12,east
04/01/2023,twelve,west
05/12/2023,also bad,north
";
        let err = validate_and_transform(csv.as_bytes(), &sales_schema()).unwrap_err();
        match &err {
            FlowlineError::SchemaViolation { record, detail } => {
                assert_eq!(*record, 3);
                assert!(detail.contains("Amount"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // Row 4's violations are never reported; the first failure wins.
        let reason = err.to_string();
        assert!(reason.contains('3'));
        assert!(reason.contains("Amount"));
    }

    #[test]
    fn test_malformed_csv_is_a_parse_error() {
        let err =
            validate_and_transform(b"Date,Amount\n01/15/2023,120,extra\n", &sales_schema())
                .unwrap_err();
        assert!(matches!(err, FlowlineError::Parse(_)));
        assert_eq!(reason_for(&err), "error reading source");
    }

    #[test]
    fn test_validation_is_deterministic() {
        let first = validate_and_transform(VALID_CSV.as_bytes(), &sales_schema()).unwrap();
        let second = validate_and_transform(VALID_CSV.as_bytes(), &sales_schema()).unwrap();
        assert_eq!(first, second);
    }
}
