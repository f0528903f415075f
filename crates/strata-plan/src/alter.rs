//! `ALTER TABLE` planning.
//!
//! A batch of edits is first collected into column and index change
//! descriptors against the original table. The table's group is then copied,
//! column edits are applied to the copy, index changes are propagated, and
//! finally new constraints, indexes and grouping edits are applied in that
//! order. The original catalog is never touched.

use serde::Serialize;
use strata_core::{
    Catalog, Column, ColumnDefault, ColumnIdentity, ColumnType, IdentityGeneration, Index,
    IndexColumn, IndexConstraint, Join, JoinColumn, Sequence, Table, TableName,
};

use crate::cascade::{JoinCascade, cascade_joins, copy_group_indexes, copy_table_indexes};
use crate::change::{ChangeLevel, ChangeType, TableChange, find_change_type, resolve_new_name};
use crate::copy::{add_parent_table, copy_table};
use crate::ddl::DdlFunctions;
use crate::errors::{PlanError, Result};
use crate::index::{IndexOwner, attach, build_index, build_table_index};
use crate::naming::NameGenerator;
use crate::request::{
    AlterTableRequest, ColumnDefinition, ConstraintDefinition, ConstraintKind, DropConstraintKind,
    ExistenceCheck, GroupingForeignKey, IdentityChange, IdentityDefinition, IndexColumnRef,
    IndexDefinition, TableElement,
};

/// Planner settings supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerOptions {
    /// Schema used for unqualified table names.
    pub default_schema: String,
    /// Reject batches that combine a table rename with other edits.
    pub strict_rename_batches: bool,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            default_schema: "public".to_string(),
            strict_rename_batches: false,
        }
    }
}

/// Accepted alteration, ready for the commit capability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlterationPlan {
    pub table: TableName,
    /// Copy of the table's group with every edit applied.
    pub working_catalog: Catalog,
    pub column_changes: Vec<TableChange>,
    pub index_changes: Vec<TableChange>,
    pub group_index_changes: Vec<TableChange>,
    /// Children whose join to the table no longer holds; each becomes the
    /// root of its own group at commit.
    pub detached_children: Vec<TableName>,
    pub level: ChangeLevel,
}

impl AlterationPlan {
    /// The altered table inside the working copy.
    pub fn candidate(&self) -> Option<&Table> {
        self.working_catalog.table(&self.table)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AlterOutcome {
    /// `IF EXISTS` on a missing table.
    Skipped,
    Rename {
        old_name: TableName,
        new_name: TableName,
    },
    Alter(AlterationPlan),
}

impl AlterOutcome {
    pub fn level(&self) -> Option<ChangeLevel> {
        match self {
            AlterOutcome::Skipped => None,
            AlterOutcome::Rename { .. } => Some(ChangeLevel::Metadata),
            AlterOutcome::Alter(plan) => Some(plan.level),
        }
    }
}

enum ColumnEdit {
    Add(ColumnDefinition),
    Default {
        name: String,
        default: Option<ColumnDefault>,
    },
    Identity {
        name: String,
        identity: IdentityDefinition,
    },
    Nullability {
        name: String,
        nullable: bool,
    },
    Type {
        name: String,
        column_type: ColumnType,
    },
}

enum GroupingEdit {
    Drop,
    Add(GroupingForeignKey),
}

#[derive(Default)]
struct Collected {
    column_changes: Vec<TableChange>,
    index_changes: Vec<TableChange>,
    column_edits: Vec<ColumnEdit>,
    constraints: Vec<ConstraintDefinition>,
    indexes: Vec<IndexDefinition>,
    grouping: Vec<GroupingEdit>,
    type_changed: bool,
}

enum Collection {
    Edits(Collected),
    Rename(TableName),
}

fn check_protected(table: &TableName, column: &str) -> Result<()> {
    if Column::is_internal_name(column) {
        return Err(PlanError::ProtectedColumn {
            table: table.clone(),
            column: column.to_string(),
        });
    }
    Ok(())
}

/// True when `name` already refers to a column after the changes so far.
fn column_name_taken(original: &Table, changes: &[TableChange], name: &str) -> bool {
    changes
        .iter()
        .any(|change| change.new_name.as_deref() == Some(name))
        || (original.column(name).is_some() && find_change_type(changes, name).is_none())
}

/// True when `name` is an original column not dropped earlier in the batch.
fn column_present(original: &Table, changes: &[TableChange], name: &str) -> bool {
    original.column(name).is_some() && find_change_type(changes, name) != Some(ChangeType::Drop)
}

fn mark_modified(changes: &mut Vec<TableChange>, name: &str) {
    if find_change_type(changes, name).is_none() {
        changes.push(TableChange::create_modify(name, name));
    }
}

fn mark_renamed(changes: &mut Vec<TableChange>, old_name: &str, new_name: &str) {
    match changes
        .iter_mut()
        .find(|change| change.old_name.as_deref() == Some(old_name))
    {
        Some(change) => change.new_name = Some(new_name.to_string()),
        None => changes.push(TableChange::create_modify(old_name, new_name)),
    }
}

fn mark_dropped(changes: &mut Vec<TableChange>, name: &str) {
    changes.retain(|change| change.old_name.as_deref() != Some(name));
    changes.push(TableChange::create_drop(name));
}

/// Records an explicit index drop, or tolerates the missing index.
fn drop_index(
    original: &Table,
    collected: &mut Collected,
    name: &str,
    existence: ExistenceCheck,
) -> Result<()> {
    if original.index(name).is_none()
        || find_change_type(&collected.index_changes, name) == Some(ChangeType::Drop)
    {
        return existence.tolerate(PlanError::NoSuchIndex {
            index: name.to_string(),
        });
    }
    mark_dropped(&mut collected.index_changes, name);
    Ok(())
}

fn collect(
    catalog: &Catalog,
    original: &Table,
    request: &AlterTableRequest,
    options: &PlannerOptions,
) -> Result<Collection> {
    let table = &original.name;
    let mut collected = Collected::default();

    for element in &request.elements {
        match element {
            TableElement::AddColumn(definition) => {
                check_protected(table, &definition.name)?;
                if column_name_taken(original, &collected.column_changes, &definition.name) {
                    definition.existence.tolerate(PlanError::DuplicateColumnName {
                        table: table.clone(),
                        column: definition.name.clone(),
                    })?;
                    continue;
                }
                collected
                    .column_changes
                    .push(TableChange::create_add(definition.name.clone()));
                collected
                    .column_edits
                    .push(ColumnEdit::Add(definition.clone()));
            }
            TableElement::DropColumn { name, existence } => {
                check_protected(table, name)?;
                if !column_present(original, &collected.column_changes, name) {
                    existence.tolerate(PlanError::NoSuchColumn {
                        table: table.clone(),
                        column: name.clone(),
                    })?;
                    continue;
                }
                mark_dropped(&mut collected.column_changes, name);
            }
            TableElement::AlterColumnDefault {
                name,
                default,
                existence,
            } => {
                if modify_target(original, &collected, table, name, *existence)? {
                    mark_modified(&mut collected.column_changes, name);
                    collected.column_edits.push(ColumnEdit::Default {
                        name: name.clone(),
                        default: default.clone(),
                    });
                }
            }
            TableElement::AlterColumnIdentity {
                name,
                change,
                existence,
            } => {
                if modify_target(original, &collected, table, name, *existence)? {
                    let identity = match change {
                        IdentityChange::Create(identity) => identity.clone(),
                        IdentityChange::SetIncrement { .. } => {
                            return Err(PlanError::unsupported(format!(
                                "SET INCREMENT BY on {table}.{name}"
                            )));
                        }
                        IdentityChange::RestartWith { .. } => {
                            return Err(PlanError::unsupported(format!(
                                "RESTART WITH on {table}.{name}"
                            )));
                        }
                    };
                    mark_modified(&mut collected.column_changes, name);
                    collected.column_edits.push(ColumnEdit::Identity {
                        name: name.clone(),
                        identity,
                    });
                }
            }
            TableElement::AlterColumnNullability {
                name,
                nullable,
                existence,
            } => {
                if modify_target(original, &collected, table, name, *existence)? {
                    mark_modified(&mut collected.column_changes, name);
                    collected.column_edits.push(ColumnEdit::Nullability {
                        name: name.clone(),
                        nullable: *nullable,
                    });
                }
            }
            TableElement::AlterColumnType {
                name,
                column_type,
                existence,
            } => {
                if modify_target(original, &collected, table, name, *existence)? {
                    mark_modified(&mut collected.column_changes, name);
                    collected.type_changed = true;
                    collected.column_edits.push(ColumnEdit::Type {
                        name: name.clone(),
                        column_type: column_type.clone(),
                    });
                }
            }
            TableElement::RenameColumn { old_name, new_name } => {
                check_protected(table, old_name)?;
                check_protected(table, new_name)?;
                if !column_present(original, &collected.column_changes, old_name) {
                    return Err(PlanError::NoSuchColumn {
                        table: table.clone(),
                        column: old_name.clone(),
                    });
                }
                if column_name_taken(original, &collected.column_changes, new_name) {
                    return Err(PlanError::DuplicateColumnName {
                        table: table.clone(),
                        column: new_name.clone(),
                    });
                }
                mark_renamed(&mut collected.column_changes, old_name, new_name);
            }
            TableElement::AddConstraint(definition) => {
                if definition.kind == ConstraintKind::Check {
                    return Err(PlanError::UnsupportedCheckConstraint);
                }
                collected.constraints.push(definition.clone());
            }
            TableElement::DropConstraint {
                kind,
                name,
                existence,
            } => drop_constraint(original, &mut collected, *kind, name.as_deref(), *existence)?,
            TableElement::AddIndex(definition) => {
                if let Some(join_type) = definition.join_type {
                    return Err(PlanError::unsupported(format!(
                        "{} JOIN index through ALTER TABLE",
                        join_type.as_str()
                    )));
                }
                collected.indexes.push(definition.clone());
            }
            TableElement::DropIndex { name, existence } => {
                drop_index(original, &mut collected, name, *existence)?;
            }
            TableElement::AddGroupingForeignKey(foreign_key) => {
                collected
                    .grouping
                    .push(GroupingEdit::Add(foreign_key.clone()));
            }
            TableElement::DropGroupingForeignKey { existence } => {
                if original.parent_join.is_none() {
                    existence.tolerate(PlanError::NoSuchGroupingForeignKey {
                        table: table.clone(),
                    })?;
                    continue;
                }
                collected.grouping.push(GroupingEdit::Drop);
            }
            TableElement::AddForeignKey(_) | TableElement::DropForeignKey { .. } => {
                return Err(PlanError::UnsupportedForeignKeyIndex);
            }
            TableElement::RenameTable { new_name } => {
                let new_name = new_name.resolve(&options.default_schema);
                if catalog.table(&new_name).is_some() {
                    return Err(PlanError::DuplicateTableName { table: new_name });
                }
                if request.elements.len() > 1 {
                    tracing::warn!(
                        event = "rename_batch_truncated",
                        table = %table,
                        dropped_elements = request.elements.len() - 1,
                        "table rename ignores the other edits in its batch"
                    );
                }
                return Ok(Collection::Rename(new_name));
            }
        }
    }
    Ok(Collection::Edits(collected))
}

/// Checks that an ALTER COLUMN target exists. `Ok(false)` means the edit
/// was skipped under `IF EXISTS`.
fn modify_target(
    original: &Table,
    collected: &Collected,
    table: &TableName,
    name: &str,
    existence: ExistenceCheck,
) -> Result<bool> {
    check_protected(table, name)?;
    if column_present(original, &collected.column_changes, name) {
        return Ok(true);
    }
    existence.tolerate(PlanError::NoSuchColumn {
        table: table.clone(),
        column: name.to_string(),
    })?;
    Ok(false)
}

fn drop_constraint(
    original: &Table,
    collected: &mut Collected,
    kind: DropConstraintKind,
    name: Option<&str>,
    existence: ExistenceCheck,
) -> Result<()> {
    let table = &original.name;
    let named = || {
        name.map(str::to_string)
            .ok_or_else(|| PlanError::unsupported("DROP CONSTRAINT without a name"))
    };
    match kind {
        DropConstraintKind::Check => Err(PlanError::UnsupportedCheckConstraint),
        DropConstraintKind::PrimaryKey => match original.primary_key() {
            Some(index) => drop_index(original, collected, &index.name, existence),
            None => existence.tolerate(PlanError::NoSuchConstraint {
                table: table.clone(),
                constraint: Index::PRIMARY.to_string(),
            }),
        },
        DropConstraintKind::Unique => {
            let constraint = named()?;
            match original
                .index_by_constraint_name(&constraint)
                .filter(|index| index.constraint == IndexConstraint::Unique)
            {
                Some(index) => drop_index(original, collected, &index.name, existence),
                None => existence.tolerate(PlanError::NoSuchUnique {
                    table: table.clone(),
                    constraint,
                }),
            }
        }
        DropConstraintKind::Any => {
            let constraint = named()?;
            if let Some(index) = original.index_by_constraint_name(&constraint) {
                return drop_index(original, collected, &index.name, existence);
            }
            if original
                .parent_join
                .as_ref()
                .is_some_and(|join| join.name == constraint)
            {
                collected.grouping.push(GroupingEdit::Drop);
                return Ok(());
            }
            existence.tolerate(PlanError::NoSuchConstraint {
                table: table.clone(),
                constraint,
            })
        }
    }
}

fn candidate<'a>(working: &'a mut Catalog, table: &TableName) -> Result<&'a mut Table> {
    working.table_mut(table).ok_or_else(|| PlanError::NoSuchTable {
        table: table.clone(),
    })
}

fn current_column<'a>(
    candidate: &'a mut Table,
    column_changes: &[TableChange],
    name: &str,
) -> Result<&'a mut Column> {
    let table = candidate.name.clone();
    let current = resolve_new_name(column_changes, name).unwrap_or_else(|| name.to_string());
    candidate
        .column_mut(&current)
        .ok_or(PlanError::NoSuchColumn {
            table,
            column: current,
        })
}

/// Mints the sequence for an identity column and binds it.
fn bind_identity(
    working: &mut Catalog,
    table: &TableName,
    column: &mut Column,
    identity: &IdentityDefinition,
    names: &mut dyn NameGenerator,
) {
    let sequence = names.identity_sequence_name(table, &column.name);
    working.add_sequence(Sequence::new(
        sequence.clone(),
        identity.start,
        identity.increment,
    ));
    column.identity = Some(ColumnIdentity {
        sequence,
        generation: identity.generation,
    });
    column.nullable = false;
}

fn new_column(
    working: &mut Catalog,
    table: &TableName,
    definition: &ColumnDefinition,
    names: &mut dyn NameGenerator,
) -> Column {
    let mut column_type = definition.column_type.clone();
    let mut nullable = definition.nullable;
    let mut identity = definition.identity.clone();
    if column_type.is_serial() {
        column_type = if column_type.name == "bigserial" {
            ColumnType::bigint()
        } else {
            ColumnType::int()
        };
        nullable = false;
        identity = identity.or(Some(IdentityDefinition {
            generation: IdentityGeneration::ByDefault,
            start: 1,
            increment: 1,
        }));
    }

    let mut column = Column::new(definition.name.clone(), column_type);
    column.nullable = nullable;
    column.default = definition.default.clone();
    if let Some(identity) = identity {
        bind_identity(working, table, &mut column, &identity, names);
    }
    column
}

fn apply_column_edits(
    working: &mut Catalog,
    table: &TableName,
    collected: &Collected,
    names: &mut dyn NameGenerator,
) -> Result<()> {
    let changes = &collected.column_changes;
    for edit in &collected.column_edits {
        match edit {
            ColumnEdit::Add(definition) => {
                let column = new_column(working, table, definition, names);
                candidate(working, table)?.add_column(column);
            }
            ColumnEdit::Default { name, default } => {
                let column = current_column(candidate(working, table)?, changes, name)?;
                column.default = default.clone();
                if let Some(identity) = column.identity.take() {
                    working.remove_sequence(&identity.sequence);
                }
            }
            ColumnEdit::Identity { name, identity } => {
                let mut column =
                    current_column(candidate(working, table)?, changes, name)?.clone();
                if column.is_generated() {
                    return Err(PlanError::ColumnAlreadyGenerated {
                        table: table.clone(),
                        column: column.name,
                    });
                }
                bind_identity(working, table, &mut column, identity, names);
                *current_column(candidate(working, table)?, changes, name)? = column;
            }
            ColumnEdit::Nullability { name, nullable } => {
                current_column(candidate(working, table)?, changes, name)?.nullable = *nullable;
            }
            ColumnEdit::Type { name, column_type } => {
                let target = candidate(working, table)?;
                let old = current_column(target, changes, name)?.clone();
                target.drop_column(&old.name);
                let mut column = Column::new(old.name.clone(), column_type.clone());
                column.nullable = old.nullable;
                column.default = old.default.clone();
                target.insert_column(old.position, column);
                if let Some(identity) = old.identity {
                    working.remove_sequence(&identity.sequence);
                }
            }
        }
    }
    Ok(())
}

fn apply_constraints(
    working: &mut Catalog,
    table: &TableName,
    collected: &mut Collected,
    names: &mut dyn NameGenerator,
) -> Result<()> {
    for definition in &collected.constraints {
        match definition.kind {
            ConstraintKind::PrimaryKey => {
                let target = candidate(working, table)?;
                if target.primary_key().is_some() {
                    return Err(PlanError::DuplicateIndex {
                        table: table.clone(),
                        index: Index::PRIMARY.to_string(),
                    });
                }
                if definition.columns.is_empty() {
                    return Err(PlanError::unsupported("PRIMARY KEY without columns"));
                }
                let mut index = Index::table_index(Index::PRIMARY, IndexConstraint::PrimaryKey);
                index.constraint_name = definition.name.clone();
                for name in &definition.columns {
                    let column = target.column_mut(name).ok_or_else(|| PlanError::NoSuchColumn {
                        table: table.clone(),
                        column: name.clone(),
                    })?;
                    column.nullable = false;
                    if !collected
                        .column_changes
                        .iter()
                        .any(|change| change.new_name.as_deref() == Some(name.as_str()))
                    {
                        collected
                            .column_changes
                            .push(TableChange::create_modify(name.clone(), name.clone()));
                    }
                    index
                        .columns
                        .push(IndexColumn::new(table.clone(), name.clone()));
                }
                target.indexes.push(index);
                collected
                    .index_changes
                    .push(TableChange::create_add(Index::PRIMARY));
            }
            ConstraintKind::Unique => {
                let first = definition
                    .columns
                    .first()
                    .ok_or_else(|| PlanError::unsupported("UNIQUE without columns"))?;
                let name = match &definition.name {
                    Some(name) => name.clone(),
                    None => names.index_name(table, first),
                };
                if candidate(working, table)?.index(&name).is_some() {
                    return Err(PlanError::DuplicateIndex {
                        table: table.clone(),
                        index: name,
                    });
                }
                let constraint_name = match &definition.name {
                    Some(constraint) => constraint.clone(),
                    None => names.unique_constraint_name(table, &name),
                };
                let mut request = IndexDefinition::new(
                    name.clone(),
                    definition
                        .columns
                        .iter()
                        .map(IndexColumnRef::column)
                        .collect(),
                );
                request.unique = true;
                let index =
                    build_table_index(working, table, &name, &request, Some(constraint_name))?;
                candidate(working, table)?.indexes.push(index);
                collected.index_changes.push(TableChange::create_add(name));
            }
            ConstraintKind::Check => return Err(PlanError::UnsupportedCheckConstraint),
        }
    }
    Ok(())
}

fn apply_indexes(
    working: &mut Catalog,
    table: &TableName,
    collected: &mut Collected,
    group_index_changes: &mut Vec<TableChange>,
    names: &mut dyn NameGenerator,
) -> Result<()> {
    for definition in &collected.indexes {
        let first = definition
            .columns
            .first()
            .ok_or_else(|| PlanError::unsupported("index without key columns"))?;
        let name = match &definition.name {
            Some(name) => name.clone(),
            None => names.index_name(table, &first.column),
        };
        if candidate(working, table)?.index(&name).is_some() {
            return Err(PlanError::DuplicateIndex {
                table: table.clone(),
                index: name,
            });
        }
        let constraint_name = definition
            .unique
            .then(|| names.unique_constraint_name(table, &name));
        let built = build_index(working, table, &name, definition, constraint_name)?;
        match built.owner {
            IndexOwner::Table(_) => collected.index_changes.push(TableChange::create_add(name)),
            IndexOwner::Group(_) => group_index_changes.push(TableChange::create_add(name)),
        }
        attach(working, built)?;
    }
    Ok(())
}

fn apply_grouping(
    catalog: &Catalog,
    original: &Table,
    working: &mut Catalog,
    collected: &Collected,
    options: &PlannerOptions,
    names: &mut dyn NameGenerator,
) -> Result<()> {
    let table = &original.name;
    for edit in &collected.grouping {
        match edit {
            GroupingEdit::Drop => {
                let target = candidate(working, table)?;
                target.parent_join = None;
                target.group = None;
            }
            GroupingEdit::Add(foreign_key) => {
                if original.parent_join.is_some() {
                    return Err(PlanError::JoinToMultipleParents {
                        table: table.clone(),
                    });
                }
                let parent = foreign_key.parent.resolve(&options.default_schema);
                add_parent_table(working, catalog, &parent)?;
                if &parent == table {
                    return Err(PlanError::JoinToSelf {
                        table: table.clone(),
                    });
                }

                let parent_table = working.table(&parent).ok_or_else(|| PlanError::NoSuchTable {
                    table: parent.clone(),
                })?;
                let primary_key: Vec<String> = parent_table
                    .primary_key_columns()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                let referenced = if foreign_key.parent_columns.is_empty() {
                    primary_key.clone()
                } else {
                    foreign_key.parent_columns.clone()
                };
                if foreign_key.columns.len() != primary_key.len()
                    || referenced.len() != primary_key.len()
                {
                    return Err(PlanError::JoinColumnCountMismatch {
                        table: table.clone(),
                        parent: parent.clone(),
                        columns: foreign_key.columns.len(),
                        primary_key_columns: primary_key.len(),
                    });
                }

                let child = candidate(working, table)?;
                for column in &foreign_key.columns {
                    if child.column(column).is_none() {
                        return Err(PlanError::NoSuchColumn {
                            table: table.clone(),
                            column: column.clone(),
                        });
                    }
                }
                let parent_table = working.table(&parent).ok_or_else(|| PlanError::NoSuchTable {
                    table: parent.clone(),
                })?;
                for (column, parent_column) in foreign_key.columns.iter().zip(&referenced) {
                    if parent_table.column(parent_column).is_none() {
                        return Err(PlanError::JoinToWrongColumns {
                            table: table.clone(),
                            column: column.clone(),
                            parent: parent.clone(),
                            parent_column: parent_column.clone(),
                        });
                    }
                }

                let name = match &foreign_key.name {
                    Some(name) => name.clone(),
                    None => names.join_name(&parent, table),
                };
                let join = Join {
                    name,
                    parent: parent.clone(),
                    child: table.clone(),
                    columns: referenced
                        .iter()
                        .zip(&foreign_key.columns)
                        .map(|(parent, child)| JoinColumn {
                            parent: parent.clone(),
                            child: child.clone(),
                        })
                        .collect(),
                };
                let target = candidate(working, table)?;
                target.parent_join = Some(join);
                target.group = None;
            }
        }
    }
    Ok(())
}

/// Original names of the columns whose type changes.
fn retyped_columns(collected: &Collected) -> Vec<String> {
    collected
        .column_edits
        .iter()
        .filter_map(|edit| match edit {
            ColumnEdit::Type { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

fn change_level(
    collected: &Collected,
    group_index_changes: &[TableChange],
    joins: &JoinCascade,
) -> ChangeLevel {
    if !collected.grouping.is_empty() || joins.regroups() {
        return ChangeLevel::Group;
    }
    let layout_changed = collected.type_changed
        || collected
            .column_changes
            .iter()
            .any(|change| change.change_type != ChangeType::Modify);
    if layout_changed || !collected.index_changes.is_empty() || !group_index_changes.is_empty() {
        ChangeLevel::Table
    } else {
        ChangeLevel::Metadata
    }
}

/// Plans an `ALTER TABLE` batch against `catalog`.
pub fn plan_alter_table(
    catalog: &Catalog,
    request: &AlterTableRequest,
    options: &PlannerOptions,
    names: &mut dyn NameGenerator,
) -> Result<AlterOutcome> {
    let table = request.table.resolve(&options.default_schema);
    let Some(original) = catalog.table(&table) else {
        request
            .existence
            .tolerate(PlanError::NoSuchTable { table })?;
        return Ok(AlterOutcome::Skipped);
    };
    if request.elements.is_empty() {
        return Err(PlanError::EmptyAlteration { table });
    }
    if options.strict_rename_batches
        && request.elements.len() > 1
        && request
            .elements
            .iter()
            .any(|element| matches!(element, TableElement::RenameTable { .. }))
    {
        return Err(PlanError::RenameMixedWithOtherChanges { table });
    }

    let mut collected = match collect(catalog, original, request, options)? {
        Collection::Rename(new_name) => {
            tracing::info!(event = "rename_planned", table = %table, new_name = %new_name);
            return Ok(AlterOutcome::Rename {
                old_name: table,
                new_name,
            });
        }
        Collection::Edits(collected) => collected,
    };

    let mut working = copy_table(catalog, &table, &collected.column_changes)?;
    apply_column_edits(&mut working, &table, &collected, names)?;

    let mut group_index_changes = Vec::new();
    copy_table_indexes(
        original,
        &mut working,
        &collected.column_changes,
        &mut collected.index_changes,
    );
    copy_group_indexes(
        catalog.group_of(&table),
        &table,
        &mut working,
        &collected.column_changes,
        &mut group_index_changes,
    );
    let primary_key_changed = original
        .primary_key()
        .is_some_and(|index| find_change_type(&collected.index_changes, &index.name).is_some());
    let joins = cascade_joins(
        &table,
        &mut working,
        &collected.column_changes,
        &retyped_columns(&collected),
        primary_key_changed,
    );

    apply_constraints(&mut working, &table, &mut collected, names)?;
    apply_indexes(
        &mut working,
        &table,
        &mut collected,
        &mut group_index_changes,
        names,
    )?;
    apply_grouping(catalog, original, &mut working, &collected, options, names)?;

    let level = change_level(&collected, &group_index_changes, &joins);
    tracing::info!(
        event = "alteration_planned",
        table = %table,
        level = ?level,
        column_changes = collected.column_changes.len(),
        index_changes = collected.index_changes.len(),
        group_index_changes = group_index_changes.len(),
        detached_children = joins.detached_children.len()
    );

    Ok(AlterOutcome::Alter(AlterationPlan {
        table,
        working_catalog: working,
        column_changes: collected.column_changes,
        index_changes: collected.index_changes,
        group_index_changes,
        detached_children: joins.detached_children,
        level,
    }))
}

/// Plans an alteration and hands it to the rename or commit capability.
pub fn execute_alter_table(
    ddl: &mut dyn DdlFunctions,
    request: &AlterTableRequest,
    options: &PlannerOptions,
    names: &mut dyn NameGenerator,
) -> Result<AlterOutcome> {
    let outcome = plan_alter_table(ddl.catalog(), request, options, names)?;
    match &outcome {
        AlterOutcome::Skipped => {}
        AlterOutcome::Rename { old_name, new_name } => ddl.rename_table(old_name, new_name)?,
        AlterOutcome::Alter(plan) => {
            ddl.alter_table(plan)?;
        }
    }
    Ok(outcome)
}
