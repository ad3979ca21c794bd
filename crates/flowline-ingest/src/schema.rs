//! Declarative field schema and record evaluator
//!
//! A schema maps field names to a small closed set of rules: value type,
//! required-presence, an allowed-value set, and an optional date format.
//! `validate_record` is a pure function returning every violation found in
//! one record; callers decide whether to aggregate across records or stop
//! at the first bad row.

use chrono::{NaiveDate, NaiveDateTime};
use flowline_common::{FlowlineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value type a field must parse as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
        }
    }
}

/// Rule set for a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Expected value type
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Fields are required unless explicitly marked optional
    #[serde(default = "default_true")]
    pub required: bool,
    /// Closed set of admissible values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
    /// strftime date format; presence installs a date coercion that
    /// overrides the plain type check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Field schema: mapping from field name to its rule set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: BTreeMap<String, FieldRule>,
}

impl Schema {
    /// Parse a schema from its JSON-encoded configuration form
    pub fn from_json(json: &str) -> Result<Self> {
        let schema: Schema = serde_json::from_str(json)?;
        Ok(schema)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn rule(&self, field: &str) -> Option<&FieldRule> {
        self.fields.get(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// A single rule violation found in a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub kind: ViolationKind,
}

/// The closed set of ways a field can fail its rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Required field absent or empty
    Missing,
    /// Field present in the record but not in the schema
    UnknownField,
    /// Value failed the type check
    WrongType { expected: FieldType },
    /// Value failed the date coercion
    BadDateFormat { format: String },
    /// Value outside the allowed set
    NotAllowed { value: String },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ViolationKind::Missing => write!(f, "{}: required field is missing", self.field),
            ViolationKind::UnknownField => write!(f, "{}: unknown field", self.field),
            ViolationKind::WrongType { expected } => {
                write!(f, "{}: must be of {} type", self.field, expected.as_str())
            }
            ViolationKind::BadDateFormat { format } => {
                write!(f, "{}: does not match date format {}", self.field, format)
            }
            ViolationKind::NotAllowed { value } => {
                write!(f, "{}: unallowed value {}", self.field, value)
            }
        }
    }
}

/// Render a violation list the way it appears in a failure reason
pub fn describe_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate one record against the schema
///
/// The record is an ordered list of `(field, value)` pairs as read from a
/// CSV row. Returns every violation in the record; an empty vector means
/// the record is valid. Unknown-field tolerance is disabled and all schema
/// fields are required unless their rule says otherwise.
pub fn validate_record<'a, I>(schema: &Schema, record: I) -> Vec<Violation>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut violations = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for (field, value) in record {
        seen.push(field);

        let Some(rule) = schema.rule(field) else {
            violations.push(Violation {
                field: field.to_string(),
                kind: ViolationKind::UnknownField,
            });
            continue;
        };

        if value.is_empty() {
            if rule.required {
                violations.push(Violation {
                    field: field.to_string(),
                    kind: ViolationKind::Missing,
                });
            }
            continue;
        }

        violations.extend(check_value(field, value, rule));
    }

    // Schema fields the record never supplied at all.
    for field in schema.field_names() {
        if !seen.contains(&field) {
            let required = schema.rule(field).map(|r| r.required).unwrap_or(true);
            if required {
                violations.push(Violation {
                    field: field.to_string(),
                    kind: ViolationKind::Missing,
                });
            }
        }
    }

    violations
}

fn check_value(field: &str, value: &str, rule: &FieldRule) -> Vec<Violation> {
    let mut violations = Vec::new();

    // A date format acts as a coercion: failure to parse is the field's
    // type violation, and the plain type check is skipped.
    if let Some(format) = &rule.format {
        if !parses_as_date(value, format) {
            violations.push(Violation {
                field: field.to_string(),
                kind: ViolationKind::BadDateFormat {
                    format: format.clone(),
                },
            });
        }
    } else if !parses_as(value, rule.field_type) {
        violations.push(Violation {
            field: field.to_string(),
            kind: ViolationKind::WrongType {
                expected: rule.field_type,
            },
        });
    }

    if let Some(allowed) = &rule.allowed {
        if !allowed.iter().any(|a| a == value) {
            violations.push(Violation {
                field: field.to_string(),
                kind: ViolationKind::NotAllowed {
                    value: value.to_string(),
                },
            });
        }
    }

    violations
}

fn parses_as(value: &str, field_type: FieldType) -> bool {
    match field_type {
        FieldType::String => true,
        FieldType::Integer => value.parse::<i64>().is_ok(),
        FieldType::Float => value.parse::<f64>().is_ok(),
        FieldType::Boolean => matches!(
            value.to_ascii_lowercase().as_str(),
            "true" | "false" | "0" | "1"
        ),
    }
}

fn parses_as_date(value: &str, format: &str) -> bool {
    NaiveDateTime::parse_from_str(value, format).is_ok()
        || NaiveDate::parse_from_str(value, format).is_ok()
}

/// Map a failing record to the error carried in the validation result
pub fn record_failure(index: usize, violations: &[Violation]) -> FlowlineError {
    FlowlineError::SchemaViolation {
        record: index,
        detail: describe_violations(violations),
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
                "Region": {"type": "string", "required": true, "allowed": ["north", "south"]},
                "Note": {"type": "string", "required": false}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_schema_from_json_defaults() {
        let schema = Schema::from_json(r#"{"Amount": {"type": "integer"}}"#).unwrap();
        let rule = schema.rule("Amount").unwrap();
        assert_eq!(rule.field_type, FieldType::Integer);
        assert!(rule.required);
        assert!(rule.allowed.is_none());
    }

    #[test]
    fn test_valid_record_has_no_violations() {
        let schema = sales_schema();
        let record = vec![
            ("Date", "01/15/2023"),
            ("Amount", "120"),
            ("Region", "north"),
            ("Note", ""),
        ];
        assert!(validate_record(&schema, record).is_empty());
    }

    #[test]
    fn test_wrong_type_is_reported() {
        let schema = sales_schema();
        let record = vec![
            ("Date", "01/15/2023"),
            ("Amount", "a lot"),
            ("Region", "north"),
        ];
        let violations = validate_record(&schema, record);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "Amount");
        assert_eq!(
            violations[0].kind,
            ViolationKind::WrongType {
                expected: FieldType::Integer
            }
        );
    }

    #[test]
    fn test_bad_date_is_a_type_violation_for_that_field() {
        let schema = sales_schema();
        let record = vec![
            ("Date", "2023-01-15"),
            ("Amount", "120"),
            ("Region", "north"),
        ];
        let violations = validate_record(&schema, record);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "Date");
        assert!(matches!(
            violations[0].kind,
            ViolationKind::BadDateFormat { .. }
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let schema = sales_schema();
        let record = vec![
            ("Date", "01/15/2023"),
            ("Amount", "120"),
            ("Region", "north"),
            ("Extra", "x"),
        ];
        let violations = validate_record(&schema, record);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::UnknownField);
    }

    #[test]
    fn test_missing_required_field() {
        let schema = sales_schema();
        let record = vec![("Date", "01/15/2023"), ("Amount", "120")];
        let violations = validate_record(&schema, record);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "Region");
        assert_eq!(violations[0].kind, ViolationKind::Missing);
    }

    #[test]
    fn test_empty_optional_field_is_fine() {
        let schema = sales_schema();
        let record = vec![
            ("Date", "01/15/2023"),
            ("Amount", "120"),
            ("Region", "south"),
            ("Note", ""),
        ];
        assert!(validate_record(&schema, record).is_empty());
    }

    #[test]
    fn test_allowed_set_enforced() {
        let schema = sales_schema();
        let record = vec![
            ("Date", "01/15/2023"),
            ("Amount", "120"),
            ("Region", "west"),
        ];
        let violations = validate_record(&schema, record);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].kind,
            ViolationKind::NotAllowed {
                value: "west".to_string()
            }
        );
    }

    #[test]
    fn test_multiple_violations_aggregated_per_record() {
        let schema = sales_schema();
        let record = vec![("Date", "junk"), ("Amount", "junk"), ("Region", "junk")];
        let violations = validate_record(&schema, record);
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn test_record_failure_mentions_row_and_field() {
        let schema = sales_schema();
        let record = vec![
            ("Date", "01/15/2023"),
            ("Amount", "oops"),
            ("Region", "north"),
        ];
        let violations = validate_record(&schema, record);
        let err = record_failure(3, &violations).to_string();
        assert!(err.contains('3'));
        assert!(err.contains("Amount"));
    }

    #[test]
    fn test_describe_violations_joins_all() {
        let violations = vec![
            Violation {
                field: "A".to_string(),
                kind: ViolationKind::Missing,
            },
            Violation {
                field: "B".to_string(),
                kind: ViolationKind::UnknownField,
            },
        ];
        let text = describe_violations(&violations);
        assert!(text.contains("A: required field is missing"));
        assert!(text.contains("B: unknown field"));
    }
}
