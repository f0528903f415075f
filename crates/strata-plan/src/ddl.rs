//! Commit-side capabilities the planner hands its results to.

use std::collections::BTreeSet;

use strata_core::{Catalog, Group, TableName};

use crate::alter::AlterationPlan;
use crate::change::ChangeLevel;
use crate::errors::{PlanError, Result};
use crate::index::{BuiltIndex, attach};

/// External DDL capabilities: commit, rename, create and drop indexes.
pub trait DdlFunctions {
    /// Snapshot the planner reads from.
    fn catalog(&self) -> &Catalog;

    fn rename_table(&mut self, old_name: &TableName, new_name: &TableName) -> Result<()>;

    /// Commits an accepted alteration and reports the level it was applied at.
    fn alter_table(&mut self, plan: &AlterationPlan) -> Result<ChangeLevel>;

    fn create_indexes(&mut self, indexes: Vec<BuiltIndex>) -> Result<()>;

    fn drop_table_indexes(&mut self, table: &TableName, indexes: &[String]) -> Result<()>;

    fn drop_group_indexes(&mut self, group: &TableName, indexes: &[String]) -> Result<()>;
}

/// Applies DDL to an owned in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogDdl {
    catalog: Catalog,
}

impl CatalogDdl {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn into_catalog(self) -> Catalog {
        self.catalog
    }

    /// Tables joined below `table`, including `table` itself.
    fn subtree(&self, table: &TableName) -> Vec<TableName> {
        let mut members = vec![table.clone()];
        let mut next = 0;
        while next < members.len() {
            let parent = members[next].clone();
            members.extend(
                self.catalog
                    .child_joins(&parent)
                    .map(|join| join.child.clone())
                    .collect::<Vec<_>>(),
            );
            next += 1;
        }
        members
    }

    /// Moves `table` and its subtree into the group its parent join implies,
    /// or into a new group rooted at `table`.
    fn regroup(&mut self, table: &TableName) -> Result<()> {
        let parent = self
            .catalog
            .table(table)
            .ok_or_else(|| PlanError::NoSuchTable {
                table: table.clone(),
            })?
            .parent_join
            .as_ref()
            .map(|join| join.parent.clone());

        let group = match parent {
            Some(parent) => self
                .catalog
                .table(&parent)
                .and_then(|parent| parent.group.clone())
                .ok_or(PlanError::NoSuchGroup { table: parent })?,
            None => {
                match self.catalog.group_mut(table) {
                    Some(group) => group.root = table.clone(),
                    None => self
                        .catalog
                        .groups
                        .push(Group::new(table.clone(), table.clone())),
                }
                table.clone()
            }
        };

        for member in self.subtree(table) {
            if let Some(member) = self.catalog.table_mut(&member) {
                member.group = Some(group.clone());
            }
        }

        let catalog = &mut self.catalog;
        let membership: Vec<(TableName, BTreeSet<TableName>)> = catalog
            .groups
            .iter()
            .map(|group| {
                let members = catalog
                    .tables_in_group(&group.name)
                    .map(|table| table.name.clone())
                    .collect();
                (group.name.clone(), members)
            })
            .collect();
        for (name, members) in membership {
            if let Some(group) = catalog.group_mut(&name) {
                group.indexes.retain(|index| {
                    let inside = index
                        .columns
                        .iter()
                        .all(|column| members.contains(&column.table));
                    if !inside {
                        tracing::debug!(
                            event = "group_index_detached",
                            group = %name,
                            index = %index.name
                        );
                    }
                    inside
                });
            }
        }
        let tables = &catalog.tables;
        catalog
            .groups
            .retain(|group| tables.iter().any(|table| table.group.as_ref() == Some(&group.name)));
        Ok(())
    }
}

impl DdlFunctions for CatalogDdl {
    fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn rename_table(&mut self, old_name: &TableName, new_name: &TableName) -> Result<()> {
        if self.catalog.table(new_name).is_some() {
            return Err(PlanError::DuplicateTableName {
                table: new_name.clone(),
            });
        }
        let table = self
            .catalog
            .table_mut(old_name)
            .ok_or_else(|| PlanError::NoSuchTable {
                table: old_name.clone(),
            })?;
        table.name = new_name.clone();

        let rename = |name: &mut TableName| {
            if name == old_name {
                *name = new_name.clone();
            }
        };
        for table in &mut self.catalog.tables {
            if let Some(join) = table.parent_join.as_mut() {
                rename(&mut join.parent);
                rename(&mut join.child);
            }
            for index in &mut table.indexes {
                index.columns.iter_mut().for_each(|column| rename(&mut column.table));
            }
        }
        for group in &mut self.catalog.groups {
            rename(&mut group.root);
            for index in &mut group.indexes {
                index.columns.iter_mut().for_each(|column| rename(&mut column.table));
            }
        }
        tracing::info!(event = "table_renamed", old_name = %old_name, new_name = %new_name);
        Ok(())
    }

    fn alter_table(&mut self, plan: &AlterationPlan) -> Result<ChangeLevel> {
        let missing = || PlanError::NoSuchTable {
            table: plan.table.clone(),
        };
        let candidate = plan.candidate().ok_or_else(missing)?.clone();
        let original = self.catalog.table(&plan.table).ok_or_else(missing)?.clone();
        let children: Vec<TableName> = self
            .catalog
            .child_joins(&plan.table)
            .map(|join| join.child.clone())
            .collect();

        let bound: BTreeSet<TableName> = candidate
            .columns
            .iter()
            .filter_map(|column| column.identity.as_ref())
            .map(|identity| identity.sequence.clone())
            .collect();
        for identity in original.columns.iter().filter_map(|column| column.identity.as_ref()) {
            if !bound.contains(&identity.sequence) {
                self.catalog.remove_sequence(&identity.sequence);
            }
        }
        for sequence in &bound {
            if let Some(sequence) = plan.working_catalog.sequence(sequence) {
                self.catalog.add_sequence(sequence.clone());
            }
        }

        if let Some(group_name) = &original.group {
            let rebuilt: Vec<_> = plan
                .working_catalog
                .group(group_name)
                .map(|group| {
                    group
                        .indexes
                        .iter()
                        .filter(|index| index.references_table(&plan.table))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            if let Some(group) = self.catalog.group_mut(group_name) {
                group.indexes.retain(|index| !index.references_table(&plan.table));
                group.indexes.extend(rebuilt);
            }
        }

        *self.catalog.table_mut(&plan.table).ok_or_else(missing)? = candidate;
        for child in &children {
            let Some(copy) = plan.working_catalog.table(child) else {
                continue;
            };
            if let Some(target) = self.catalog.table_mut(child) {
                target.parent_join = copy.parent_join.clone();
            }
        }
        if plan.level == ChangeLevel::Group {
            self.regroup(&plan.table)?;
            for child in &plan.detached_children {
                self.regroup(child)?;
            }
        }
        tracing::info!(event = "alteration_committed", table = %plan.table, level = ?plan.level);
        Ok(plan.level)
    }

    fn create_indexes(&mut self, indexes: Vec<BuiltIndex>) -> Result<()> {
        for built in indexes {
            tracing::info!(event = "index_created", index = %built.index.name);
            attach(&mut self.catalog, built)?;
        }
        Ok(())
    }

    fn drop_table_indexes(&mut self, table: &TableName, indexes: &[String]) -> Result<()> {
        let target = self
            .catalog
            .table_mut(table)
            .ok_or_else(|| PlanError::NoSuchTable {
                table: table.clone(),
            })?;
        for name in indexes {
            target
                .remove_index(name)
                .ok_or_else(|| PlanError::NoSuchIndex { index: name.clone() })?;
            tracing::info!(event = "index_dropped", table = %table, index = %name);
        }
        Ok(())
    }

    fn drop_group_indexes(&mut self, group: &TableName, indexes: &[String]) -> Result<()> {
        let target = self
            .catalog
            .group_mut(group)
            .ok_or_else(|| PlanError::NoSuchGroup {
                table: group.clone(),
            })?;
        for name in indexes {
            target
                .remove_index(name)
                .ok_or_else(|| PlanError::NoSuchIndex { index: name.clone() })?;
            tracing::info!(event = "group_index_dropped", group = %group, index = %name);
        }
        Ok(())
    }
}
