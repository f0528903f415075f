//! Fluent construction of catalogs for fixtures and tooling.
//!
//! Every table starts as the root of its own single-table group; `join`
//! moves the child (and its subtree) into the parent's group.

use crate::index::{Index, IndexColumn, IndexConstraint, IndexJoinType};
use crate::join::{Join, JoinColumn};
use crate::name::TableName;
use crate::schema::{Catalog, Column, Group, Sequence, Table};
use crate::types::{ColumnDefault, ColumnIdentity, ColumnType, IdentityGeneration};

pub struct CatalogBuilder {
    default_schema: String,
    catalog: Catalog,
}

impl CatalogBuilder {
    pub fn new(default_schema: impl Into<String>) -> Self {
        Self {
            default_schema: default_schema.into(),
            catalog: Catalog::new(),
        }
    }

    /// Resolves `schema.table` or a bare table name in the default schema.
    pub fn name(&self, name: &str) -> TableName {
        match name.split_once('.') {
            Some((schema, table)) => TableName::new(schema, table),
            None => TableName::new(self.default_schema.clone(), name),
        }
    }

    /// Returns a builder for `name`, creating the table if needed.
    pub fn table(&mut self, name: &str) -> TableBuilder<'_> {
        let name = self.name(name);
        if self.catalog.table(&name).is_none() {
            let mut table = Table::new(name.clone());
            table.group = Some(name.clone());
            self.catalog.tables.push(table);
            self.catalog
                .groups
                .push(Group::new(name.clone(), name.clone()));
        }
        TableBuilder {
            catalog: &mut self.catalog,
            name,
        }
    }

    /// Joins `child` under `parent` using `(parent column, child column)` pairs.
    pub fn join(&mut self, child: &str, parent: &str, columns: &[(&str, &str)]) -> &mut Self {
        let child = self.name(child);
        let parent = self.name(parent);
        let join = Join {
            name: format!("{}_{}", child.table, parent.table),
            parent: parent.clone(),
            child: child.clone(),
            columns: columns
                .iter()
                .map(|(parent, child)| JoinColumn {
                    parent: parent.to_string(),
                    child: child.to_string(),
                })
                .collect(),
        };

        let target_group = self
            .catalog
            .table(&parent)
            .and_then(|table| table.group.clone());
        let old_group = self
            .catalog
            .table(&child)
            .and_then(|table| table.group.clone());

        if let Some(table) = self.catalog.table_mut(&child) {
            table.parent_join = Some(join);
        }
        if let Some(old_group) = old_group {
            self.catalog.groups.retain(|group| group.name != old_group);
            for table in &mut self.catalog.tables {
                if table.group.as_ref() == Some(&old_group) {
                    table.group = target_group.clone();
                }
            }
        }
        self
    }

    /// Adds a group index to the group containing `table`. Columns are
    /// `(table, column)` pairs.
    pub fn group_index(
        &mut self,
        table: &str,
        name: &str,
        join_type: IndexJoinType,
        columns: &[(&str, &str)],
    ) -> &mut Self {
        let table = self.name(table);
        let mut index = Index::group_index(name, join_type);
        index.columns = columns
            .iter()
            .map(|(table, column)| IndexColumn::new(self.name(table), *column))
            .collect();
        let group = self
            .catalog
            .table(&table)
            .and_then(|table| table.group.clone());
        if let Some(group) = group.and_then(|group| self.catalog.group_mut(&group)) {
            group.indexes.push(index);
        }
        self
    }

    pub fn build(self) -> Catalog {
        self.catalog
    }
}

/// Chainable column and index definitions for one table.
pub struct TableBuilder<'a> {
    catalog: &'a mut Catalog,
    name: TableName,
}

impl TableBuilder<'_> {
    fn with_table(self, apply: impl FnOnce(&mut Table)) -> Self {
        if let Some(table) = self.catalog.table_mut(&self.name) {
            apply(table);
        }
        self
    }

    fn with_column(self, column: &str, apply: impl FnOnce(&mut Column)) -> Self {
        self.with_table(|table| {
            if let Some(column) = table.column_mut(column) {
                apply(column);
            }
        })
    }

    pub fn column(self, name: &str, column_type: ColumnType) -> Self {
        let column = Column::new(name, column_type);
        self.with_table(|table| table.add_column(column))
    }

    pub fn int(self, name: &str) -> Self {
        self.column(name, ColumnType::int())
    }

    pub fn bigint(self, name: &str) -> Self {
        self.column(name, ColumnType::bigint())
    }

    pub fn varchar(self, name: &str, length: u32) -> Self {
        self.column(name, ColumnType::varchar(length))
    }

    pub fn decimal(self, name: &str, precision: u32, scale: u32) -> Self {
        self.column(name, ColumnType::decimal(precision, scale))
    }

    pub fn not_null(self, column: &str) -> Self {
        self.with_column(column, |column| column.nullable = false)
    }

    pub fn default_value(self, column: &str, value: &str) -> Self {
        let value = ColumnDefault::Value(value.to_string());
        self.with_column(column, |column| column.default = Some(value))
    }

    /// Binds `column` to a fresh `<table>_<column>_seq` sequence.
    pub fn identity(self, column: &str, generation: IdentityGeneration) -> Self {
        let sequence = TableName::new(
            self.name.schema.clone(),
            format!("{}_{}_seq", self.name.table, column),
        );
        self.catalog
            .add_sequence(Sequence::new(sequence.clone(), 1, 1));
        self.with_column(column, |column| {
            column.nullable = false;
            column.identity = Some(ColumnIdentity {
                sequence,
                generation,
            });
        })
    }

    fn with_index(
        self,
        name: &str,
        constraint: IndexConstraint,
        columns: &[&str],
        spatial: Option<(usize, usize)>,
    ) -> Self {
        let table_name = self.name.clone();
        let mut index = Index::table_index(name, constraint);
        if constraint != IndexConstraint::Key {
            index.constraint_name = Some(name.to_string());
        }
        index.columns = columns
            .iter()
            .map(|column| IndexColumn::new(table_name.clone(), *column))
            .collect();
        if let Some((first, dimensions)) = spatial {
            index.mark_spatial(first, dimensions);
        }
        self.with_table(|table| table.indexes.push(index))
    }

    /// Declares the primary key, forcing its columns NOT NULL.
    pub fn pk(self, columns: &[&str]) -> Self {
        let mut builder =
            self.with_index(Index::PRIMARY, IndexConstraint::PrimaryKey, columns, None);
        for column in columns {
            builder = builder.not_null(column);
        }
        builder
    }

    pub fn unique(self, name: &str, columns: &[&str]) -> Self {
        self.with_index(name, IndexConstraint::Unique, columns, None)
    }

    pub fn key(self, name: &str, columns: &[&str]) -> Self {
        self.with_index(name, IndexConstraint::Key, columns, None)
    }

    pub fn spatial_key(
        self,
        name: &str,
        columns: &[&str],
        first: usize,
        dimensions: usize,
    ) -> Self {
        self.with_index(name, IndexConstraint::Key, columns, Some((first, dimensions)))
    }
}
