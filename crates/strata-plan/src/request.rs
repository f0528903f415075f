//! Typed DDL requests consumed by the planner.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strata_core::{ColumnDefault, ColumnType, IdentityGeneration, TableName};

use crate::errors::{PlanError, Result};

/// Optionally schema-qualified table name as written in a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QualifiedName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
}

impl QualifiedName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    pub fn unqualified(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// Fills a missing schema from `default_schema`.
    pub fn resolve(&self, default_schema: &str) -> TableName {
        TableName::new(
            self.schema.as_deref().unwrap_or(default_schema),
            self.name.clone(),
        )
    }
}

/// Per-object existence modifier (`IF EXISTS` / `IF NOT EXISTS`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExistenceCheck {
    #[default]
    NoCondition,
    IfExists,
    IfNotExists,
}

impl ExistenceCheck {
    /// Swallows `err` when this modifier allows it: `IF EXISTS` covers
    /// missing objects and `IF NOT EXISTS` covers duplicates.
    pub fn tolerate(self, err: PlanError) -> Result<()> {
        let skip = match self {
            ExistenceCheck::IfExists => err.is_missing_object(),
            ExistenceCheck::IfNotExists => matches!(
                err,
                PlanError::DuplicateColumnName { .. }
                    | PlanError::DuplicateIndex { .. }
                    | PlanError::DuplicateTableName { .. }
            ),
            ExistenceCheck::NoCondition => false,
        };
        if skip {
            tracing::warn!(event = "existence_check_skipped", error = %err);
            Ok(())
        } else {
            Err(err)
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_one() -> i64 {
    1
}

/// `GENERATED ... AS IDENTITY` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IdentityDefinition {
    pub generation: IdentityGeneration,
    #[serde(default = "default_one")]
    pub start: i64,
    #[serde(default = "default_one")]
    pub increment: i64,
}

/// A new column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ColumnDefault>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityDefinition>,
    #[serde(default)]
    pub existence: ExistenceCheck,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            default: None,
            identity: None,
            existence: ExistenceCheck::NoCondition,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Check,
}

/// `ADD [CONSTRAINT name] PRIMARY KEY | UNIQUE | CHECK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConstraintDefinition {
    pub kind: ConstraintKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DropConstraintKind {
    PrimaryKey,
    Unique,
    Check,
    /// Plain `DROP CONSTRAINT name`, resolved against indexes then joins.
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentityChange {
    Create(IdentityDefinition),
    SetIncrement { increment: i64 },
    RestartWith { start: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestedJoinType {
    Left,
    Right,
    Inner,
}

impl RequestedJoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestedJoinType::Left => "LEFT",
            RequestedJoinType::Right => "RIGHT",
            RequestedJoinType::Inner => "INNER",
        }
    }
}

/// Index key column, optionally qualified by table (and schema).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IndexColumnRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub column: String,
    #[serde(default = "default_true")]
    pub ascending: bool,
}

impl IndexColumnRef {
    pub fn column(column: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: None,
            column: column.into(),
            ascending: true,
        }
    }

    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            ..Self::column(column)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpatialFunction {
    ZOrderLatLon,
}

/// Spatial function applied to key columns `first..=last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SpatialMarker {
    pub function: SpatialFunction,
    pub first: usize,
    pub last: usize,
}

/// Index as requested by `CREATE INDEX` or `ALTER TABLE ... ADD INDEX`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IndexDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<IndexColumnRef>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_type: Option<RequestedJoinType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial: Option<SpatialMarker>,
}

impl IndexDefinition {
    pub fn new(name: impl Into<String>, columns: Vec<IndexColumnRef>) -> Self {
        Self {
            name: Some(name.into()),
            columns,
            unique: false,
            join_type: None,
            spatial: None,
        }
    }
}

/// `ADD [CONSTRAINT name] GROUPING FOREIGN KEY (cols) REFERENCES parent (cols)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GroupingForeignKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub parent: QualifiedName,
    /// Empty means the parent's primary key.
    #[serde(default)]
    pub parent_columns: Vec<String>,
}

/// Ordinary (non-grouping) foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub referenced: QualifiedName,
    #[serde(default)]
    pub referenced_columns: Vec<String>,
}

/// One element of an `ALTER TABLE` batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableElement {
    AddColumn(ColumnDefinition),
    DropColumn {
        name: String,
        #[serde(default)]
        existence: ExistenceCheck,
    },
    /// `SET DEFAULT`, or `DROP DEFAULT` when `default` is absent.
    AlterColumnDefault {
        name: String,
        #[serde(default)]
        default: Option<ColumnDefault>,
        #[serde(default)]
        existence: ExistenceCheck,
    },
    AlterColumnIdentity {
        name: String,
        change: IdentityChange,
        #[serde(default)]
        existence: ExistenceCheck,
    },
    AlterColumnNullability {
        name: String,
        nullable: bool,
        #[serde(default)]
        existence: ExistenceCheck,
    },
    AlterColumnType {
        name: String,
        column_type: ColumnType,
        #[serde(default)]
        existence: ExistenceCheck,
    },
    RenameColumn {
        old_name: String,
        new_name: String,
    },
    AddConstraint(ConstraintDefinition),
    DropConstraint {
        kind: DropConstraintKind,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        existence: ExistenceCheck,
    },
    AddIndex(IndexDefinition),
    DropIndex {
        name: String,
        #[serde(default)]
        existence: ExistenceCheck,
    },
    AddGroupingForeignKey(GroupingForeignKey),
    DropGroupingForeignKey {
        #[serde(default)]
        existence: ExistenceCheck,
    },
    AddForeignKey(ForeignKeyDefinition),
    DropForeignKey {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        existence: ExistenceCheck,
    },
    RenameTable {
        new_name: QualifiedName,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AlterTableRequest {
    pub table: QualifiedName,
    #[serde(default)]
    pub existence: ExistenceCheck,
    pub elements: Vec<TableElement>,
}

impl AlterTableRequest {
    pub fn new(table: QualifiedName, elements: Vec<TableElement>) -> Self {
        Self {
            table,
            existence: ExistenceCheck::NoCondition,
            elements,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CreateIndexRequest {
    pub table: QualifiedName,
    pub index: IndexDefinition,
    #[serde(default)]
    pub existence: ExistenceCheck,
}

/// `DROP INDEX [schema.][table.]name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DropIndexRequest {
    /// Owning table; when absent every table and group is searched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<QualifiedName>,
    /// Limits the table search when `table` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
    #[serde(default)]
    pub existence: ExistenceCheck,
}

/// Any request document accepted by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "statement", rename_all = "snake_case")]
pub enum DdlRequest {
    AlterTable(AlterTableRequest),
    CreateIndex(CreateIndexRequest),
    DropIndex(DropIndexRequest),
}
