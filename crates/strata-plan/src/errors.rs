use strata_core::TableName;
use thiserror::Error;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// Structured validation issue with location and hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub path: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(
        severity: IssueSeverity,
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            path: path.into(),
            message: message.into(),
            hint,
        }
    }
}

/// Aggregated validation report with errors and warnings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error issue.
    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    /// Add a warning issue.
    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Broad classification of planning failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A named table, column, index, constraint or group does not exist.
    Reference,
    /// The requested structure is malformed.
    Shape,
    /// The request is well-formed but not supported.
    Capability,
    /// A name resolves to more than one object.
    Ambiguity,
    /// The request document itself could not be read.
    Document,
}

/// Planning failures. Every variant aborts the statement.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("table not found: {table}")]
    NoSuchTable { table: TableName },
    #[error("column not found: {table}.{column}")]
    NoSuchColumn { table: TableName, column: String },
    #[error("index not found: {index}")]
    NoSuchIndex { index: String },
    #[error("unique constraint not found on {table}: {constraint}")]
    NoSuchUnique { table: TableName, constraint: String },
    #[error("constraint not found on {table}: {constraint}")]
    NoSuchConstraint { table: TableName, constraint: String },
    #[error("group not found for table {table}")]
    NoSuchGroup { table: TableName },
    #[error("table {table} has no grouping foreign key")]
    NoSuchGroupingForeignKey { table: TableName },

    #[error("table already exists: {table}")]
    DuplicateTableName { table: TableName },
    #[error("duplicate column name: {table}.{column}")]
    DuplicateColumnName { table: TableName, column: String },
    #[error("duplicate index name on {table}: {index}")]
    DuplicateIndex { table: TableName, index: String },
    #[error("column {column} of {table} is internal and cannot be altered")]
    ProtectedColumn { table: TableName, column: String },
    #[error("column {table}.{column} is already generated")]
    ColumnAlreadyGenerated { table: TableName, column: String },

    #[error("table {table} already joins to a parent")]
    JoinToMultipleParents { table: TableName },
    #[error("table {table} cannot join to itself")]
    JoinToSelf { table: TableName },
    #[error(
        "join from {table} to {parent} lists {columns} columns but the parent primary key has {primary_key_columns}"
    )]
    JoinColumnCountMismatch {
        table: TableName,
        parent: TableName,
        columns: usize,
        primary_key_columns: usize,
    },
    #[error("join from {table}.{column} references missing column {parent}.{parent_column}")]
    JoinToWrongColumns {
        table: TableName,
        column: String,
        parent: TableName,
        parent_column: String,
    },

    #[error("table index {index} cannot declare a join type")]
    TableIndexJoinTypeNotAllowed { index: String },
    #[error("group index {index} requires a join type")]
    MissingGroupIndexJoinType { index: String },
    #[error("group index {index} uses unsupported join type {join_type}")]
    UnsupportedGroupIndexJoinType { index: String, join_type: String },
    #[error("group index {index} cannot be unique")]
    UnsupportedUniqueGroupIndex { index: String },
    #[error("index {index} column {column} is on {table}, which is outside the group")]
    IndexTableNotInGroup {
        index: String,
        column: String,
        table: TableName,
    },
    #[error("index {index} on {table} has an invalid spatial definition")]
    BadSpatialIndex { table: TableName, index: String },
    #[error("index name {index} is ambiguous")]
    IndistinguishableIndex { index: String },

    #[error("check constraints are not supported")]
    UnsupportedCheckConstraint,
    #[error("non-grouping foreign keys are not supported")]
    UnsupportedForeignKeyIndex,
    #[error("unsupported alteration: {detail}")]
    UnsupportedAlteration { detail: String },
    #[error("alter table {table} names no changes")]
    EmptyAlteration { table: TableName },
    #[error("rename of {table} cannot be combined with other changes")]
    RenameMixedWithOtherChanges { table: TableName },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlanError {
    pub fn category(&self) -> ErrorCategory {
        use PlanError::*;
        match self {
            NoSuchTable { .. }
            | NoSuchColumn { .. }
            | NoSuchIndex { .. }
            | NoSuchUnique { .. }
            | NoSuchConstraint { .. }
            | NoSuchGroup { .. }
            | NoSuchGroupingForeignKey { .. } => ErrorCategory::Reference,
            DuplicateTableName { .. }
            | DuplicateColumnName { .. }
            | DuplicateIndex { .. }
            | ProtectedColumn { .. }
            | ColumnAlreadyGenerated { .. }
            | JoinToMultipleParents { .. }
            | JoinToSelf { .. }
            | JoinColumnCountMismatch { .. }
            | JoinToWrongColumns { .. }
            | IndexTableNotInGroup { .. }
            | BadSpatialIndex { .. }
            | EmptyAlteration { .. }
            | RenameMixedWithOtherChanges { .. } => ErrorCategory::Shape,
            TableIndexJoinTypeNotAllowed { .. }
            | MissingGroupIndexJoinType { .. }
            | UnsupportedGroupIndexJoinType { .. }
            | UnsupportedUniqueGroupIndex { .. }
            | UnsupportedCheckConstraint
            | UnsupportedForeignKeyIndex
            | UnsupportedAlteration { .. } => ErrorCategory::Capability,
            IndistinguishableIndex { .. } => ErrorCategory::Ambiguity,
            Json(_) | Schema(_) | Io(_) => ErrorCategory::Document,
        }
    }

    /// True for "does not exist" failures that `IF EXISTS` may suppress.
    pub fn is_missing_object(&self) -> bool {
        self.category() == ErrorCategory::Reference
    }

    pub(crate) fn unsupported(detail: impl Into<String>) -> Self {
        PlanError::UnsupportedAlteration {
            detail: detail.into(),
        }
    }
}

/// Result type for planning operations.
pub type Result<T> = std::result::Result<T, PlanError>;
