use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::name::TableName;

/// Whether an index lives on a single table or spans a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Table,
    Group,
}

/// Constraint semantics carried by an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IndexConstraint {
    PrimaryKey,
    Unique,
    Key,
}

/// Join semantics of a group index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IndexJoinType {
    Left,
    Right,
}

/// Contiguous run of key columns collapsed into one spatial dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SpatialRange {
    /// Position of the first spatial key column.
    pub first: usize,
    /// Number of key columns covered.
    pub dimensions: usize,
}

impl SpatialRange {
    /// One past the last spatial key column, `None` on overflow.
    pub fn end(&self) -> Option<usize> {
        self.first.checked_add(self.dimensions)
    }

    pub fn last(&self) -> usize {
        self.first
            .saturating_add(self.dimensions)
            .saturating_sub(1)
    }

    pub fn contains(&self, position: usize) -> bool {
        position >= self.first && position - self.first < self.dimensions
    }
}

/// One key column of an index. The column position is its offset in
/// [`Index::columns`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IndexColumn {
    pub table: TableName,
    pub column: String,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_ascending() -> bool {
    true
}

impl IndexColumn {
    pub fn new(table: TableName, column: impl Into<String>) -> Self {
        Self {
            table,
            column: column.into(),
            ascending: true,
        }
    }
}

/// Table or group index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Index {
    pub name: String,
    pub kind: IndexKind,
    pub constraint: IndexConstraint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
    pub is_unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_type: Option<IndexJoinType>,
    pub columns: Vec<IndexColumn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial: Option<SpatialRange>,
}

impl Index {
    /// Name given to every primary-key index.
    pub const PRIMARY: &'static str = "PRIMARY";

    /// Creates an empty table index; key columns are pushed afterwards.
    pub fn table_index(name: impl Into<String>, constraint: IndexConstraint) -> Self {
        Self {
            name: name.into(),
            kind: IndexKind::Table,
            constraint,
            constraint_name: None,
            is_unique: constraint != IndexConstraint::Key,
            join_type: None,
            columns: Vec::new(),
            spatial: None,
        }
    }

    /// Creates an empty, non-unique group index.
    pub fn group_index(name: impl Into<String>, join_type: IndexJoinType) -> Self {
        Self {
            name: name.into(),
            kind: IndexKind::Group,
            constraint: IndexConstraint::Key,
            constraint_name: None,
            is_unique: false,
            join_type: Some(join_type),
            columns: Vec::new(),
            spatial: None,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.constraint == IndexConstraint::PrimaryKey
    }

    pub fn is_spatial(&self) -> bool {
        self.spatial.is_some()
    }

    /// Marks `dimensions` key columns starting at `first` as one spatial value.
    pub fn mark_spatial(&mut self, first: usize, dimensions: usize) {
        self.spatial = Some(SpatialRange { first, dimensions });
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.column.as_str()).collect()
    }

    /// Returns true if any key column belongs to `table`.
    pub fn references_table(&self, table: &TableName) -> bool {
        self.columns.iter().any(|col| &col.table == table)
    }
}
