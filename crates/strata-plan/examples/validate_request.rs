use std::env;
use std::path::{Path, PathBuf};

use serde_json::Value;
use strata_core::Catalog;
use strata_plan::{
    ValidationReport, parse_request, request_json_schema_value, validate_request_against_catalog,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let mut request_path: Option<PathBuf> = None;
    let mut catalog_path: Option<PathBuf> = None;
    let mut default_schema = "public".to_string();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--catalog" => {
                catalog_path = args.next().map(PathBuf::from);
            }
            "--default-schema" => {
                default_schema = args.next().ok_or("missing --default-schema value")?;
            }
            _ => {
                if request_path.is_none() {
                    request_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let request_path = request_path.ok_or("missing request path")?;
    let catalog_path = catalog_path.ok_or("missing --catalog path")?;

    let request_json = load_json(&request_path)?;
    let catalog: Catalog = serde_json::from_value(load_json(&catalog_path)?)?;
    let schema = request_json_schema_value()?;

    let request = match parse_request(&request_json, &schema) {
        Ok(request) => request,
        Err(report) => {
            eprintln!("request validation failed");
            print_report(&report);
            std::process::exit(1);
        }
    };

    let report = validate_request_against_catalog(&request, &catalog, &default_schema);
    if !report.is_ok() {
        eprintln!("request does not apply to catalog");
        print_report(&report);
        std::process::exit(1);
    }

    if report.warnings.is_empty() {
        println!("request validated successfully");
    } else {
        eprintln!("request validated with warnings:");
        print_report(&report);
    }

    Ok(())
}

fn load_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn print_report(report: &ValidationReport) {
    let issues = report
        .errors
        .iter()
        .map(|issue| ("error", issue))
        .chain(report.warnings.iter().map(|issue| ("warning", issue)));
    for (level, issue) in issues {
        eprintln!("{level} {} {}: {}", issue.code, issue.path, issue.message);
        if let Some(hint) = &issue.hint {
            eprintln!("  hint: {hint}");
        }
    }
}
