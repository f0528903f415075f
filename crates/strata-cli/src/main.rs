mod registry;
mod workspace;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use registry::{RunContext, RunPaths, RunSettings, init_run_logging, start_run, write_artifact};
use serde::Serialize;
use strata_core::{
    Catalog, Error as CoreError, GroupTree, JoinGraphReport, build_group_tree,
    build_join_graph_report, validate_catalog,
};
use strata_plan::{
    AlterOutcome, BuiltIndex, CatalogDdl, DdlRequest, DefaultNameGenerator, DropIndexPlan,
    PlanError, PlannerOptions, ValidationReport, execute_alter_table, execute_create_index,
    execute_drop_index, parse_request, request_json_schema, request_json_schema_value,
    validate_request_against_catalog,
};
use thiserror::Error;
use uuid::Uuid;
use workspace::{StrataSettings, load_or_create_settings, write_json_atomic};

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("workspace error: {0}")]
    Workspace(#[from] workspace::WorkspaceError),
    #[error("catalog error: {0}")]
    Core(#[from] CoreError),
    #[error("plan error: {0}")]
    Plan(#[from] PlanError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Strata schema alteration planner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan one DDL request against a catalog.
    Plan(PlanArgs),
    /// Validate a catalog and report its join graph and groups.
    Check(CheckArgs),
    /// Print a JSON Schema.
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct SettingsArgs {
    /// Settings file, created with defaults when missing.
    #[arg(long, default_value = "strata.toml")]
    config: PathBuf,
    /// Output directory for runs.
    #[arg(long)]
    run_dir: Option<PathBuf>,
    /// Log filter for stderr when STRATA_LOG is unset.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Path to catalog.json.
    #[arg(long)]
    catalog: PathBuf,
    /// Path to the request document.
    #[arg(long)]
    request: PathBuf,
    /// Write the committed catalog here.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Schema for unqualified table names.
    #[arg(long)]
    default_schema: Option<String>,
    /// Reject table renames batched with other edits.
    #[arg(long, default_value_t = false)]
    strict_rename_batches: bool,
    #[command(flatten)]
    settings: SettingsArgs,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Path to catalog.json.
    #[arg(long)]
    catalog: PathBuf,
    #[command(flatten)]
    settings: SettingsArgs,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    #[arg(value_enum, default_value_t = SchemaKind::Request)]
    kind: SchemaKind,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaKind {
    Request,
    Catalog,
}

/// Contents of `plan.json`.
#[derive(Debug, Serialize)]
#[serde(tag = "statement", rename_all = "snake_case")]
enum PlanArtifact {
    AlterTable(AlterOutcome),
    CreateIndex { index: Option<BuiltIndex> },
    DropIndex { dropped: Option<DropIndexPlan> },
}

/// Contents of `report.json` for `check`.
#[derive(Debug, Serialize)]
struct CheckReport {
    catalog_version: String,
    tables: usize,
    sequences: usize,
    join_graph: JoinGraphReport,
    groups: Vec<GroupTree>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Plan(args) => run_plan(args),
        Command::Check(args) => run_check(args),
        Command::Schema(args) => print_schema(args.kind),
    }
}

fn run_plan(args: PlanArgs) -> Result<(), CliError> {
    let mut settings = load_settings(&args.settings)?;
    if let Some(schema) = args.default_schema {
        settings.default_schema = schema;
    }
    if args.strict_rename_batches {
        settings.strict_rename_batches = true;
    }

    let request_path = Some(args.request.as_path());
    let (run_id, run_paths) = begin_run("plan", &settings, &args.catalog, request_path)?;
    tracing::info!(event = "run_started", run_id = %run_id, command = "plan");
    let timer = Instant::now();

    let catalog = read_catalog(&args.catalog)?;
    let request_json = read_json(&args.request)?;
    let schema = request_json_schema_value()?;
    let request =
        parse_request(&request_json, &schema).map_err(|report| rejected("document", &report))?;

    let report = validate_request_against_catalog(&request, &catalog, &settings.default_schema);
    for issue in &report.warnings {
        tracing::warn!(
            event = "request_warning",
            code = %issue.code,
            path = %issue.path,
            message = %issue.message
        );
    }
    if !report.is_ok() {
        return Err(rejected("catalog check", &report));
    }

    let options = PlannerOptions {
        default_schema: settings.default_schema.clone(),
        strict_rename_batches: settings.strict_rename_batches,
    };
    let (artifact, committed) = plan_statement(catalog, &request, &options)?;

    write_artifact(&run_paths.plan_path, &artifact)?;
    tracing::info!(event = "plan_written", path = %run_paths.plan_path.display());

    if let Some(out) = &args.out {
        validate_catalog(&committed)?;
        write_json_atomic(out, &committed)?;
        tracing::info!(event = "catalog_written", path = %out.display());
    }

    println!("{}", serde_json::to_string_pretty(&artifact)?);

    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(event = "run_finished", status = "success", duration_ms = duration_ms);
    Ok(())
}

/// Plans `request` and commits it to an in-memory copy of `catalog`.
fn plan_statement(
    catalog: Catalog,
    request: &DdlRequest,
    options: &PlannerOptions,
) -> Result<(PlanArtifact, Catalog), CliError> {
    let mut names = DefaultNameGenerator::for_catalog(&catalog);
    let mut ddl = CatalogDdl::new(catalog);
    let schema = options.default_schema.as_str();

    let planned = match request {
        DdlRequest::AlterTable(alter) => {
            execute_alter_table(&mut ddl, alter, options, &mut names).map(PlanArtifact::AlterTable)
        }
        DdlRequest::CreateIndex(create) => {
            execute_create_index(&mut ddl, schema, create, &mut names)
                .map(|index| PlanArtifact::CreateIndex { index })
        }
        DdlRequest::DropIndex(drop_index) => execute_drop_index(&mut ddl, schema, drop_index)
            .map(|dropped| PlanArtifact::DropIndex { dropped }),
    };

    match planned {
        Ok(artifact) => Ok((artifact, ddl.into_catalog())),
        Err(err) => {
            tracing::error!(
                event = "plan_failed",
                category = ?err.category(),
                error = %err
            );
            Err(err.into())
        }
    }
}

fn run_check(args: CheckArgs) -> Result<(), CliError> {
    let settings = load_settings(&args.settings)?;
    let (run_id, run_paths) = begin_run("check", &settings, &args.catalog, None)?;
    tracing::info!(event = "run_started", run_id = %run_id, command = "check");
    let timer = Instant::now();

    let catalog = read_catalog(&args.catalog)?;
    let report = check_report(&catalog)?;

    write_artifact(&run_paths.report_path, &report)?;
    tracing::info!(event = "report_written", path = %run_paths.report_path.display());
    println!("{}", serde_json::to_string_pretty(&report)?);

    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(event = "run_finished", status = "success", duration_ms = duration_ms);
    Ok(())
}

fn check_report(catalog: &Catalog) -> Result<CheckReport, CliError> {
    let groups = catalog
        .groups
        .iter()
        .map(|group| build_group_tree(catalog, &group.name))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CheckReport {
        catalog_version: catalog.catalog_version.clone(),
        tables: catalog.tables.len(),
        sequences: catalog.sequences.len(),
        join_graph: build_join_graph_report(catalog),
        groups,
    })
}

fn print_schema(kind: SchemaKind) -> Result<(), CliError> {
    let schema = match kind {
        SchemaKind::Request => request_json_schema(),
        SchemaKind::Catalog => schemars::schema_for!(Catalog),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn load_settings(args: &SettingsArgs) -> Result<StrataSettings, CliError> {
    let mut settings = load_or_create_settings(&args.config)?;
    if let Some(run_dir) = &args.run_dir {
        settings.run_dir = run_dir.clone();
    }
    if let Some(level) = &args.log_level {
        settings.log_level = level.clone();
    }
    Ok(settings)
}

fn begin_run(
    command: &str,
    settings: &StrataSettings,
    catalog: &Path,
    request: Option<&Path>,
) -> Result<(String, RunPaths), CliError> {
    let run_id = Uuid::new_v4().to_string();
    let ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        command: command.to_string(),
        run_dir: settings.run_dir.clone(),
        catalog: catalog.to_path_buf(),
        request: request.map(Path::to_path_buf),
        settings: RunSettings {
            default_schema: settings.default_schema.clone(),
            strict_rename_batches: settings.strict_rename_batches,
            log_level: settings.log_level.clone(),
        },
    };

    let run_paths = start_run(&ctx)?;
    init_run_logging(&run_paths.logs_path, &settings.log_level)?;
    Ok((run_id, run_paths))
}

fn read_json(path: &Path) -> Result<serde_json::Value, CliError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn read_catalog(path: &Path) -> Result<Catalog, CliError> {
    let content = std::fs::read_to_string(path)?;
    let catalog: Catalog = serde_json::from_str(&content)?;
    validate_catalog(&catalog)?;
    tracing::info!(
        event = "catalog_loaded",
        tables = catalog.tables.len(),
        groups = catalog.groups.len()
    );
    Ok(catalog)
}

fn rejected(stage: &str, report: &ValidationReport) -> CliError {
    for issue in &report.errors {
        tracing::error!(
            event = "request_rejected",
            code = %issue.code,
            path = %issue.path,
            message = %issue.message,
            hint = ?issue.hint
        );
    }
    let summary = report
        .errors
        .iter()
        .map(|issue| format!("{} at {}: {}", issue.code, issue.path, issue.message))
        .collect::<Vec<_>>()
        .join("; ");
    CliError::InvalidRequest(format!("{stage}: {summary}"))
}
