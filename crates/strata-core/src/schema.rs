use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::index::{Index, IndexConstraint};
use crate::join::Join;
use crate::name::TableName;
use crate::types::{ColumnDefault, ColumnIdentity, ColumnType};

/// Top-level catalog snapshot: every table, group and sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Catalog {
    /// Contract version for this catalog format.
    pub catalog_version: String,
    pub tables: Vec<Table>,
    pub groups: Vec<Group>,
    #[serde(default)]
    pub sequences: Vec<Sequence>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            catalog_version: crate::CATALOG_VERSION.to_string(),
            tables: Vec::new(),
            groups: Vec::new(),
            sequences: Vec::new(),
        }
    }

    pub fn table(&self, name: &TableName) -> Option<&Table> {
        self.tables.iter().find(|table| &table.name == name)
    }

    pub fn table_mut(&mut self, name: &TableName) -> Option<&mut Table> {
        self.tables.iter_mut().find(|table| &table.name == name)
    }

    pub fn group(&self, name: &TableName) -> Option<&Group> {
        self.groups.iter().find(|group| &group.name == name)
    }

    pub fn group_mut(&mut self, name: &TableName) -> Option<&mut Group> {
        self.groups.iter_mut().find(|group| &group.name == name)
    }

    /// Group owning `table`, if the table is grouped.
    pub fn group_of(&self, table: &TableName) -> Option<&Group> {
        self.table(table)
            .and_then(|table| table.group.as_ref())
            .and_then(|group| self.group(group))
    }

    pub fn sequence(&self, name: &TableName) -> Option<&Sequence> {
        self.sequences.iter().find(|sequence| &sequence.name == name)
    }

    pub fn add_sequence(&mut self, sequence: Sequence) {
        self.remove_sequence(&sequence.name);
        self.sequences.push(sequence);
    }

    pub fn remove_sequence(&mut self, name: &TableName) -> Option<Sequence> {
        let position = self
            .sequences
            .iter()
            .position(|sequence| &sequence.name == name)?;
        Some(self.sequences.remove(position))
    }

    /// Tables whose group is `group`, in catalog order.
    pub fn tables_in_group<'a>(&'a self, group: &'a TableName) -> impl Iterator<Item = &'a Table> {
        self.tables
            .iter()
            .filter(move |table| table.group.as_ref() == Some(group))
    }

    /// Joins whose parent is `parent`. Child joins are never stored.
    pub fn child_joins<'a>(&'a self, parent: &'a TableName) -> impl Iterator<Item = &'a Join> {
        self.tables
            .iter()
            .filter_map(|table| table.parent_join.as_ref())
            .filter(move |join| &join.parent == parent)
    }

    /// Resolves the type of every key column and checks the spatial shape.
    ///
    /// A spatial index must cover exactly two key columns, lie within the
    /// key, and only use numeric columns. Non-spatial indexes always pass.
    pub fn is_spatial_compatible(&self, index: &Index) -> bool {
        let Some(range) = index.spatial else {
            return true;
        };
        if range.dimensions != 2 || range.end().is_none_or(|end| end > index.columns.len()) {
            return false;
        }
        index.columns[range.first..=range.last()].iter().all(|key| {
            self.table(&key.table)
                .and_then(|table| table.column(&key.column))
                .is_some_and(|column| column.column_type.is_numeric())
        })
    }
}

/// A rooted tree of tables stored together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Group {
    pub name: TableName,
    pub root: TableName,
    #[serde(default)]
    pub indexes: Vec<Index>,
}

impl Group {
    pub fn new(name: TableName, root: TableName) -> Self {
        Self {
            name,
            root,
            indexes: Vec::new(),
        }
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|index| index.name == name)
    }

    pub fn remove_index(&mut self, name: &str) -> Option<Index> {
        let position = self.indexes.iter().position(|index| index.name == name)?;
        Some(self.indexes.remove(position))
    }
}

/// A table with its columns, table indexes and optional parent join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    pub name: TableName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<TableName>,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_join: Option<Join>,
}

impl Table {
    pub fn new(name: TableName) -> Self {
        Self {
            name,
            group: None,
            columns: Vec::new(),
            indexes: Vec::new(),
            parent_join: None,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|column| column.name == name)
    }

    /// Appends `column` at the next free position.
    pub fn add_column(&mut self, mut column: Column) {
        column.position = self.columns.len();
        self.columns.push(column);
    }

    /// Places `column` at `position`, shifting later columns right.
    pub fn insert_column(&mut self, position: usize, column: Column) {
        let position = position.min(self.columns.len());
        self.columns.insert(position, column);
        self.renumber_columns();
    }

    /// Removes a column and closes the gap in positions.
    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        let position = self.columns.iter().position(|column| column.name == name)?;
        let removed = self.columns.remove(position);
        self.renumber_columns();
        Some(removed)
    }

    fn renumber_columns(&mut self) {
        for (position, column) in self.columns.iter_mut().enumerate() {
            column.position = position;
        }
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|index| index.name == name)
    }

    pub fn remove_index(&mut self, name: &str) -> Option<Index> {
        let position = self.indexes.iter().position(|index| index.name == name)?;
        Some(self.indexes.remove(position))
    }

    /// Index whose constraint name (or, failing that, index name) is `name`.
    pub fn index_by_constraint_name(&self, name: &str) -> Option<&Index> {
        self.indexes
            .iter()
            .find(|index| index.constraint_name.as_deref() == Some(name))
            .or_else(|| self.index(name))
    }

    pub fn primary_key(&self) -> Option<&Index> {
        self.indexes
            .iter()
            .find(|index| index.constraint == IndexConstraint::PrimaryKey)
    }

    /// Primary-key column names in key order; empty without a primary key.
    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.primary_key()
            .map(|index| index.column_names())
            .unwrap_or_default()
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub name: String,
    pub position: usize,
    pub column_type: ColumnType,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ColumnDefault>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<ColumnIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
}

impl Column {
    /// Hidden row identifier of tables without a declared primary key.
    pub const ROW_ID_NAME: &'static str = "__row_id";

    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            position: 0,
            column_type,
            nullable: true,
            default: None,
            identity: None,
            charset: None,
            collation: None,
        }
    }

    /// Internal columns start with a double underscore.
    pub fn is_internal_name(name: &str) -> bool {
        name.starts_with("__")
    }

    pub fn is_generated(&self) -> bool {
        self.identity.is_some()
    }
}

/// Sequence backing identity columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Sequence {
    pub name: TableName,
    pub start: i64,
    pub increment: i64,
    pub min_value: i64,
    pub max_value: i64,
    pub cycle: bool,
}

impl Sequence {
    pub fn new(name: TableName, start: i64, increment: i64) -> Self {
        Self {
            name,
            start,
            increment,
            min_value: 1,
            max_value: i64::MAX,
            cycle: false,
        }
    }
}
