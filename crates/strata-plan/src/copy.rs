//! Structural copies of catalog fragments for planning.
//!
//! The planner never mutates the catalog it is given. It works on a copy of
//! the altered table's group, which is either handed to the commit step in
//! full or discarded.

use strata_core::{Catalog, Group, Table, TableName};

use crate::change::{TableChange, resolve_new_name};
use crate::errors::{PlanError, Result};

/// Deep copy of the tables accepted by `select`, together with their group
/// records and the sequences their identity columns use.
pub fn copy_catalog(catalog: &Catalog, select: impl Fn(&Table) -> bool) -> Catalog {
    let tables: Vec<Table> = catalog
        .tables
        .iter()
        .filter(|table| select(table))
        .cloned()
        .collect();

    let groups = catalog
        .groups
        .iter()
        .filter(|group| {
            tables
                .iter()
                .any(|table| table.group.as_ref() == Some(&group.name))
        })
        .cloned()
        .collect();

    let sequences = catalog
        .sequences
        .iter()
        .filter(|sequence| {
            tables.iter().any(|table| {
                table.columns.iter().any(|column| {
                    column
                        .identity
                        .as_ref()
                        .is_some_and(|identity| identity.sequence == sequence.name)
                })
            })
        })
        .cloned()
        .collect();

    Catalog {
        catalog_version: catalog.catalog_version.clone(),
        tables,
        groups,
        sequences,
    }
}

/// Copies `table` and the rest of its group, then rebuilds the copy's
/// columns from `column_changes`.
///
/// Dropped columns are omitted, renamed columns take their new name and
/// positions are renumbered densely in original order. The copy has no
/// table indexes, and group indexes touching the table are removed; the
/// cascade pass rebuilds whichever survive.
pub fn copy_table(
    catalog: &Catalog,
    table: &TableName,
    column_changes: &[TableChange],
) -> Result<Catalog> {
    let original = catalog.table(table).ok_or_else(|| PlanError::NoSuchTable {
        table: table.clone(),
    })?;

    let mut working = copy_catalog(catalog, |candidate| {
        &candidate.name == table
            || (original.group.is_some() && candidate.group == original.group)
    });

    let mut orphaned = Vec::new();
    if let Some(copy) = working.table_mut(table) {
        copy.columns.clear();
        copy.indexes.clear();
        for column in &original.columns {
            match resolve_new_name(column_changes, &column.name) {
                Some(new_name) => {
                    let mut column = column.clone();
                    column.name = new_name;
                    copy.add_column(column);
                }
                None => {
                    if let Some(identity) = &column.identity {
                        orphaned.push(identity.sequence.clone());
                    }
                }
            }
        }
    }
    for sequence in orphaned {
        working.remove_sequence(&sequence);
    }

    if let Some(group) = original.group.as_ref().and_then(|name| working.group_mut(name)) {
        group.indexes.retain(|index| !index.references_table(table));
    }

    tracing::debug!(
        event = "table_copied",
        table = %table,
        tables = working.tables.len(),
        column_changes = column_changes.len()
    );

    Ok(working)
}

/// Brings a join parent from outside the copied group into `working`.
///
/// Only what join validation needs is reconstructed: the parent's columns,
/// its primary key and its group record.
pub fn add_parent_table(
    working: &mut Catalog,
    catalog: &Catalog,
    parent: &TableName,
) -> Result<()> {
    if working.table(parent).is_some() {
        return Ok(());
    }
    let original = catalog.table(parent).ok_or_else(|| PlanError::NoSuchTable {
        table: parent.clone(),
    })?;

    let mut copy = Table::new(original.name.clone());
    copy.group = original.group.clone();
    copy.columns = original.columns.clone();
    copy.indexes = original.primary_key().cloned().into_iter().collect();
    working.tables.push(copy);

    if let Some(group) = original.group.as_ref().and_then(|name| catalog.group(name)) {
        if working.group(&group.name).is_none() {
            working
                .groups
                .push(Group::new(group.name.clone(), group.root.clone()));
        }
    }
    Ok(())
}
