//! Index and join change propagation after a column rebuild.

use strata_core::{Catalog, Group, Index, Join, Table, TableName};

use crate::change::{ChangeType, TableChange, find_change_type, resolve_new_name};

/// Outcome of rebuilding one index against the renamed/dropped columns.
#[derive(Debug, Clone, PartialEq)]
pub enum RebuiltIndex {
    /// The index survives; `shrunk` is set when key columns were removed.
    Kept { index: Index, shrunk: bool },
    /// No key columns survive, or a spatial argument was dropped.
    Dropped,
}

/// Rebuilds `index` keeping only the surviving key columns of `table`.
///
/// Key columns of other tables are kept as they are. A surviving spatial
/// range is shifted left by the number of removed columns before it.
pub fn rebuild_index(
    index: &Index,
    table: &TableName,
    column_changes: &[TableChange],
) -> RebuiltIndex {
    let mut rebuilt = index.clone();
    rebuilt.columns.clear();
    let mut removed_before_spatial = 0;
    let mut removed = 0;

    for (position, key) in index.columns.iter().enumerate() {
        if &key.table != table {
            rebuilt.columns.push(key.clone());
            continue;
        }
        match resolve_new_name(column_changes, &key.column) {
            Some(new_name) => {
                let mut key = key.clone();
                key.column = new_name;
                rebuilt.columns.push(key);
            }
            None => {
                if let Some(range) = index.spatial {
                    if range.contains(position) {
                        return RebuiltIndex::Dropped;
                    }
                    if position < range.first {
                        removed_before_spatial += 1;
                    }
                }
                removed += 1;
            }
        }
    }

    if rebuilt.columns.is_empty() {
        return RebuiltIndex::Dropped;
    }
    if let Some(range) = rebuilt.spatial.as_mut() {
        range.first -= removed_before_spatial;
    }
    RebuiltIndex::Kept {
        index: rebuilt,
        shrunk: removed > 0,
    }
}

/// Re-creates the original table's indexes on the candidate in `working`.
///
/// Indexes already dropped by the request are skipped. The rest are
/// rebuilt; an index that loses every key column (or a spatial argument)
/// becomes a DROP, and one that only shrank becomes a MODIFY unless a
/// change for it is already listed.
pub fn copy_table_indexes(
    original: &Table,
    working: &mut Catalog,
    column_changes: &[TableChange],
    index_changes: &mut Vec<TableChange>,
) {
    let mut kept = Vec::new();
    for index in &original.indexes {
        if find_change_type(index_changes, &index.name) == Some(ChangeType::Drop) {
            continue;
        }
        match rebuild_index(index, &original.name, column_changes) {
            RebuiltIndex::Dropped => {
                tracing::debug!(
                    event = "index_cascade_drop",
                    table = %original.name,
                    index = %index.name
                );
                index_changes.push(TableChange::create_drop(index.name.clone()));
            }
            RebuiltIndex::Kept { index: rebuilt, shrunk } => {
                if shrunk && find_change_type(index_changes, &index.name).is_none() {
                    index_changes.push(TableChange::create_modify(
                        index.name.clone(),
                        index.name.clone(),
                    ));
                }
                kept.push(rebuilt);
            }
        }
    }
    if let Some(candidate) = working.table_mut(&original.name) {
        candidate.indexes.extend(kept);
    }
}

/// Same pass for the group indexes that reference the altered table.
/// Their changes are reported separately from table index changes.
pub fn copy_group_indexes(
    original_group: Option<&Group>,
    table: &TableName,
    working: &mut Catalog,
    column_changes: &[TableChange],
    group_index_changes: &mut Vec<TableChange>,
) {
    let Some(original_group) = original_group else {
        return;
    };
    let mut kept = Vec::new();
    for index in original_group
        .indexes
        .iter()
        .filter(|index| index.references_table(table))
    {
        match rebuild_index(index, table, column_changes) {
            RebuiltIndex::Dropped => {
                tracing::debug!(
                    event = "group_index_cascade_drop",
                    group = %original_group.name,
                    index = %index.name
                );
                group_index_changes.push(TableChange::create_drop(index.name.clone()));
            }
            RebuiltIndex::Kept { index: rebuilt, shrunk } => {
                if shrunk {
                    group_index_changes.push(TableChange::create_modify(
                        index.name.clone(),
                        index.name.clone(),
                    ));
                }
                kept.push(rebuilt);
            }
        }
    }
    if let Some(group) = working.group_mut(&original_group.name) {
        group.indexes.extend(kept);
    }
}

/// Joins around the altered table that no longer hold after a rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinCascade {
    /// The altered table lost its parent join.
    pub parent_dropped: bool,
    /// Children whose join to the altered table was dropped.
    pub detached_children: Vec<TableName>,
}

impl JoinCascade {
    /// True when group membership changes.
    pub fn regroups(&self) -> bool {
        self.parent_dropped || !self.detached_children.is_empty()
    }
}

#[derive(Clone, Copy)]
enum JoinSide {
    Parent,
    Child,
}

/// Renames one side of `join` through `column_changes`. `None` when a
/// column on that side was dropped or changed type.
fn follow_join(
    join: &Join,
    side: JoinSide,
    column_changes: &[TableChange],
    retyped: &[String],
) -> Option<Join> {
    let mut followed = join.clone();
    for pair in &mut followed.columns {
        let column = match side {
            JoinSide::Parent => &mut pair.parent,
            JoinSide::Child => &mut pair.child,
        };
        if retyped.iter().any(|name| name.as_str() == column.as_str()) {
            return None;
        }
        let renamed = resolve_new_name(column_changes, column.as_str())?;
        *column = renamed;
    }
    Some(followed)
}

/// Carries column renames into the joins of `table` in `working`.
///
/// `retyped` holds original names of columns whose type changed. The
/// candidate's parent join is dropped when one of its child columns is
/// gone or retyped. A child join is dropped when a referenced column is
/// gone or retyped, or when `primary_key_changed` is set. Dropped joins
/// leave the table ungrouped until commit.
pub fn cascade_joins(
    table: &TableName,
    working: &mut Catalog,
    column_changes: &[TableChange],
    retyped: &[String],
    primary_key_changed: bool,
) -> JoinCascade {
    let mut cascade = JoinCascade::default();

    if let Some(candidate) = working.table_mut(table) {
        if let Some(join) = candidate.parent_join.take() {
            match follow_join(&join, JoinSide::Child, column_changes, retyped) {
                Some(followed) => candidate.parent_join = Some(followed),
                None => {
                    tracing::debug!(
                        event = "parent_join_cascade_drop",
                        table = %table,
                        join = %join.name
                    );
                    candidate.group = None;
                    cascade.parent_dropped = true;
                }
            }
        }
    }

    for child in &mut working.tables {
        let followed = match child.parent_join.as_ref() {
            Some(join) if &join.parent == table && &child.name != table => {
                if primary_key_changed {
                    None
                } else {
                    follow_join(join, JoinSide::Parent, column_changes, retyped)
                }
            }
            _ => continue,
        };
        match followed {
            Some(join) => child.parent_join = Some(join),
            None => {
                tracing::debug!(
                    event = "child_join_cascade_drop",
                    table = %table,
                    child = %child.name
                );
                child.parent_join = None;
                child.group = None;
                cascade.detached_children.push(child.name.clone());
            }
        }
    }
    cascade
}
