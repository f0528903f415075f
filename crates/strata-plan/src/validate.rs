use jsonschema::JSONSchema;
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde_json::Value;
use strata_core::Catalog;

use crate::errors::{IssueSeverity, PlanError, ValidationIssue, ValidationReport};
use crate::request::{DdlRequest, ExistenceCheck, TableElement};

/// JSON Schema for request documents.
pub fn request_json_schema() -> RootSchema {
    schema_for!(DdlRequest)
}

/// Same schema as a JSON value, ready for [`validate_request_json`].
pub fn request_json_schema_value() -> Result<Value, PlanError> {
    Ok(serde_json::to_value(request_json_schema())?)
}

/// Validate a request document against the request JSON Schema.
pub fn validate_request_json(
    request_json: &Value,
    request_schema: &Value,
) -> Result<ValidationReport, PlanError> {
    let compiled =
        JSONSchema::compile(request_schema).map_err(|err| PlanError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(request_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Check a parsed request against a catalog before planning.
///
/// Missing target tables are errors unless the request says `IF EXISTS`,
/// in which case they are reported as warnings.
pub fn validate_request_against_catalog(
    request: &DdlRequest,
    catalog: &Catalog,
    default_schema: &str,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    let (table, existence, path) = match request {
        DdlRequest::AlterTable(alter) => {
            if alter.elements.is_empty() {
                report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    "empty_alteration",
                    "/elements",
                    "alter table request names no changes",
                    None,
                ));
            }
            let renames = alter
                .elements
                .iter()
                .filter(|element| matches!(element, TableElement::RenameTable { .. }))
                .count();
            if renames > 0 && alter.elements.len() > 1 {
                report.push_warning(ValidationIssue::new(
                    IssueSeverity::Warning,
                    "rename_mixed_with_changes",
                    "/elements",
                    "a table rename ends the batch; later elements are ignored",
                    Some("issue the rename as its own request".to_string()),
                ));
            }
            (Some(&alter.table), alter.existence, "/table")
        }
        DdlRequest::CreateIndex(create) => {
            if create.index.columns.is_empty() {
                report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    "empty_index",
                    "/index/columns",
                    "index has no key columns",
                    None,
                ));
            }
            (Some(&create.table), ExistenceCheck::NoCondition, "/table")
        }
        DdlRequest::DropIndex(drop) => (drop.table.as_ref(), drop.existence, "/table"),
    };

    if let Some(table) = table {
        let resolved = table.resolve(default_schema);
        if catalog.table(&resolved).is_none() {
            let message = format!("table {resolved} does not exist");
            if existence == ExistenceCheck::IfExists {
                report.push_warning(ValidationIssue::new(
                    IssueSeverity::Warning,
                    "unknown_table",
                    path,
                    message,
                    None,
                ));
            } else {
                report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    "unknown_table",
                    path,
                    message,
                    Some("check the schema name or the default_schema setting".to_string()),
                ));
            }
        }
    }

    report
}

/// Validate a request end-to-end: JSON Schema first, then typed parsing.
pub fn parse_request(
    request_json: &Value,
    request_schema: &Value,
) -> Result<DdlRequest, ValidationReport> {
    let structural = match validate_request_json(request_json, request_schema) {
        Ok(report) => report,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_validation_error",
                "/",
                err.to_string(),
                None,
            ));
            return Err(report);
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    serde_json::from_value(request_json.clone()).map_err(|err| {
        let mut report = ValidationReport::default();
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "invalid_request_json",
            "/",
            err.to_string(),
            None,
        ));
        report
    })
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
