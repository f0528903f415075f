use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::graph::build_join_graph_report;
use crate::index::{Index, IndexColumn, IndexKind};
use crate::schema::{Catalog, Table};

/// Validate internal consistency of a catalog.
///
/// This checks:
/// - duplicate tables/groups/sequences/columns/indexes
/// - column positions are dense and zero-based
/// - index key columns exist and belong to the owning table or group
/// - parent joins match the parent's primary key
/// - the join graph is acyclic and identity sequences exist
pub fn validate_catalog(catalog: &Catalog) -> Result<()> {
    let mut tables = BTreeSet::new();
    for table in &catalog.tables {
        if !tables.insert(&table.name) {
            return Err(Error::InvalidCatalog(format!(
                "duplicate table name: {}",
                table.name
            )));
        }
    }

    let mut groups = BTreeSet::new();
    for group in &catalog.groups {
        if !groups.insert(&group.name) {
            return Err(Error::InvalidCatalog(format!(
                "duplicate group name: {}",
                group.name
            )));
        }
        if catalog.table(&group.root).is_none() {
            return Err(Error::InvalidCatalog(format!(
                "group {} root not found: {}",
                group.name, group.root
            )));
        }
        let mut names = BTreeSet::new();
        for index in &group.indexes {
            if !names.insert(index.name.as_str()) {
                return Err(Error::InvalidCatalog(format!(
                    "duplicate group index name: {}.{}",
                    group.name, index.name
                )));
            }
            if index.kind != IndexKind::Group {
                return Err(Error::InvalidCatalog(format!(
                    "group {} owns non-group index {}",
                    group.name, index.name
                )));
            }
            for key in &index.columns {
                let in_group = catalog
                    .table(&key.table)
                    .is_some_and(|table| table.group.as_ref() == Some(&group.name));
                if !in_group {
                    return Err(Error::InvalidCatalog(format!(
                        "group index {}.{} references table outside the group: {}",
                        group.name, index.name, key.table
                    )));
                }
                check_index_column(catalog, index, key)?;
            }
        }
    }

    let mut sequences = BTreeSet::new();
    for sequence in &catalog.sequences {
        if !sequences.insert(&sequence.name) {
            return Err(Error::InvalidCatalog(format!(
                "duplicate sequence name: {}",
                sequence.name
            )));
        }
    }

    for table in &catalog.tables {
        validate_table(catalog, table)?;
    }

    let report = build_join_graph_report(catalog);
    if let Some(cycle) = report.cycle {
        let names: Vec<String> = cycle.iter().map(ToString::to_string).collect();
        return Err(Error::InvalidCatalog(format!(
            "join cycle detected: {}",
            names.join(", ")
        )));
    }

    Ok(())
}

fn validate_table(catalog: &Catalog, table: &Table) -> Result<()> {
    let mut columns = BTreeSet::new();
    for (position, column) in table.columns.iter().enumerate() {
        if !columns.insert(column.name.as_str()) {
            return Err(Error::InvalidCatalog(format!(
                "duplicate column name: {}.{}",
                table.name, column.name
            )));
        }
        if column.position != position {
            return Err(Error::InvalidCatalog(format!(
                "column {}.{} has position {}, expected {}",
                table.name, column.name, column.position, position
            )));
        }
        if let Some(identity) = &column.identity {
            if catalog.sequence(&identity.sequence).is_none() {
                return Err(Error::InvalidCatalog(format!(
                    "identity sequence not found for {}.{}: {}",
                    table.name, column.name, identity.sequence
                )));
            }
        }
    }

    if let Some(group) = &table.group {
        if catalog.group(group).is_none() {
            return Err(Error::InvalidCatalog(format!(
                "table {} names missing group {}",
                table.name, group
            )));
        }
    }

    let mut names = BTreeSet::new();
    let mut primary_keys = 0;
    for index in &table.indexes {
        if !names.insert(index.name.as_str()) {
            return Err(Error::InvalidCatalog(format!(
                "duplicate index name: {}.{}",
                table.name, index.name
            )));
        }
        if index.kind != IndexKind::Table {
            return Err(Error::InvalidCatalog(format!(
                "table {} owns non-table index {}",
                table.name, index.name
            )));
        }
        if index.is_primary_key() {
            primary_keys += 1;
        }
        if index.columns.is_empty() {
            return Err(Error::InvalidCatalog(format!(
                "index has no key columns: {}.{}",
                table.name, index.name
            )));
        }
        for key in &index.columns {
            if key.table != table.name {
                return Err(Error::InvalidCatalog(format!(
                    "table index {}.{} references another table: {}",
                    table.name, index.name, key.table
                )));
            }
            check_index_column(catalog, index, key)?;
        }
    }
    if primary_keys > 1 {
        return Err(Error::InvalidCatalog(format!(
            "table {} has {} primary keys",
            table.name, primary_keys
        )));
    }

    if let Some(join) = &table.parent_join {
        if join.child != table.name {
            return Err(Error::InvalidCatalog(format!(
                "parent join {} of {} names child {}",
                join.name, table.name, join.child
            )));
        }
        let parent = catalog.table(&join.parent).ok_or_else(|| {
            Error::InvalidCatalog(format!(
                "parent table not found for join {}: {}",
                join.name, join.parent
            ))
        })?;
        let parent_pk = parent.primary_key_columns();
        if join.columns.len() != parent_pk.len() {
            return Err(Error::InvalidCatalog(format!(
                "join {} has {} columns but {} has {} primary key columns",
                join.name,
                join.columns.len(),
                parent.name,
                parent_pk.len()
            )));
        }
        for pair in &join.columns {
            if table.column(&pair.child).is_none() {
                return Err(Error::InvalidCatalog(format!(
                    "join child column not found: {}.{}",
                    table.name, pair.child
                )));
            }
            if parent.column(&pair.parent).is_none() {
                return Err(Error::InvalidCatalog(format!(
                    "join parent column not found: {}.{}",
                    parent.name, pair.parent
                )));
            }
        }
        if parent.group != table.group {
            return Err(Error::InvalidCatalog(format!(
                "joined tables {} and {} are in different groups",
                parent.name, table.name
            )));
        }
    }

    Ok(())
}

fn check_index_column(catalog: &Catalog, index: &Index, key: &IndexColumn) -> Result<()> {
    let found = catalog
        .table(&key.table)
        .is_some_and(|table| table.column(&key.column).is_some());
    if found {
        Ok(())
    } else {
        Err(Error::InvalidCatalog(format!(
            "index column not found: {}.{} ({})",
            key.table, key.column, index.name
        )))
    }
}
