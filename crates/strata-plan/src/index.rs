//! Index classification, construction, and the CREATE/DROP INDEX entry points.

use serde::Serialize;
use strata_core::{
    Catalog, Index, IndexColumn, IndexConstraint, IndexJoinType, IndexKind, TableName,
};

use crate::ddl::DdlFunctions;
use crate::errors::{PlanError, Result};
use crate::naming::NameGenerator;
use crate::request::{
    CreateIndexRequest, DropIndexRequest, IndexColumnRef, IndexDefinition, RequestedJoinType,
};

/// Table an index key column refers to, defaulting to the index table.
fn column_table(column: &IndexColumnRef, table: &TableName) -> TableName {
    match &column.table {
        Some(name) => TableName::new(
            column.schema.clone().unwrap_or_else(|| table.schema.clone()),
            name.clone(),
        ),
        None => table.clone(),
    }
}

/// Classifies a requested index as table-local or group-scoped.
///
/// An index is a table index iff every column is unqualified or qualified
/// by `table` itself (schema optional, names compared case-insensitively).
pub fn check_index_type(definition: &IndexDefinition, table: &TableName) -> IndexKind {
    let local = definition.columns.iter().all(|column| match &column.table {
        None => true,
        Some(name) => {
            name.eq_ignore_ascii_case(&table.table)
                && column
                    .schema
                    .as_ref()
                    .is_none_or(|schema| schema.eq_ignore_ascii_case(&table.schema))
        }
    });
    if local {
        IndexKind::Table
    } else {
        IndexKind::Group
    }
}

fn check_ascending(column: &IndexColumnRef) -> Result<()> {
    if column.ascending {
        Ok(())
    } else {
        Err(PlanError::unsupported(format!(
            "descending index column {}",
            column.column
        )))
    }
}

fn mark_spatial(index: &mut Index, definition: &IndexDefinition, table: &TableName) -> Result<()> {
    if let Some(marker) = definition.spatial {
        if marker.last < marker.first || marker.last >= definition.columns.len() {
            return Err(PlanError::BadSpatialIndex {
                table: table.clone(),
                index: index.name.clone(),
            });
        }
        index.mark_spatial(marker.first, marker.last - marker.first + 1);
    }
    Ok(())
}

pub fn build_table_index(
    catalog: &Catalog,
    table: &TableName,
    name: &str,
    definition: &IndexDefinition,
    constraint_name: Option<String>,
) -> Result<Index> {
    if definition.join_type.is_some() {
        return Err(PlanError::TableIndexJoinTypeNotAllowed {
            index: name.to_string(),
        });
    }
    let target = catalog.table(table).ok_or_else(|| PlanError::NoSuchTable {
        table: table.clone(),
    })?;

    let constraint = if definition.unique {
        IndexConstraint::Unique
    } else {
        IndexConstraint::Key
    };
    let mut index = Index::table_index(name, constraint);
    index.constraint_name = constraint_name;
    mark_spatial(&mut index, definition, table)?;

    for column in &definition.columns {
        let found = target
            .column(&column.column)
            .ok_or_else(|| PlanError::NoSuchColumn {
                table: table.clone(),
                column: column.column.clone(),
            })?;
        check_ascending(column)?;
        index
            .columns
            .push(IndexColumn::new(table.clone(), found.name.clone()));
    }
    Ok(index)
}

pub fn build_group_index(
    catalog: &Catalog,
    table: &TableName,
    name: &str,
    definition: &IndexDefinition,
) -> Result<Index> {
    let target = catalog.table(table).ok_or_else(|| PlanError::NoSuchTable {
        table: table.clone(),
    })?;
    let group = target
        .group
        .as_ref()
        .and_then(|group| catalog.group(group))
        .ok_or_else(|| PlanError::NoSuchGroup {
            table: table.clone(),
        })?;

    if definition.unique {
        return Err(PlanError::UnsupportedUniqueGroupIndex {
            index: name.to_string(),
        });
    }
    let join_type = match definition.join_type {
        None => {
            return Err(PlanError::MissingGroupIndexJoinType {
                index: name.to_string(),
            });
        }
        Some(RequestedJoinType::Left) => IndexJoinType::Left,
        Some(RequestedJoinType::Right) => IndexJoinType::Right,
        Some(other @ RequestedJoinType::Inner) => {
            return Err(PlanError::UnsupportedGroupIndexJoinType {
                index: name.to_string(),
                join_type: other.as_str().to_string(),
            });
        }
    };

    let mut index = Index::group_index(name, join_type);
    mark_spatial(&mut index, definition, table)?;

    for column in &definition.columns {
        let owner = column_table(column, table);
        let owner_table = catalog.table(&owner).ok_or_else(|| PlanError::NoSuchTable {
            table: owner.clone(),
        })?;
        if owner_table.group.as_ref() != Some(&group.name) {
            return Err(PlanError::IndexTableNotInGroup {
                index: name.to_string(),
                column: column.column.clone(),
                table: owner,
            });
        }
        let found = owner_table
            .column(&column.column)
            .ok_or_else(|| PlanError::NoSuchColumn {
                table: owner.clone(),
                column: column.column.clone(),
            })?;
        check_ascending(column)?;
        index.columns.push(IndexColumn::new(owner, found.name.clone()));
    }
    Ok(index)
}

/// Where a built index is to be stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "owner", content = "name", rename_all = "snake_case")]
pub enum IndexOwner {
    Table(TableName),
    Group(TableName),
}

/// A fully-built index and its owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltIndex {
    pub owner: IndexOwner,
    pub index: Index,
}

/// Classifies and builds an index on `table`, then checks its spatial shape.
pub fn build_index(
    catalog: &Catalog,
    table: &TableName,
    name: &str,
    definition: &IndexDefinition,
    constraint_name: Option<String>,
) -> Result<BuiltIndex> {
    let built = match check_index_type(definition, table) {
        IndexKind::Table => {
            tracing::debug!(
                event = "index_classified",
                kind = "table",
                table = %table,
                index = name
            );
            BuiltIndex {
                owner: IndexOwner::Table(table.clone()),
                index: build_table_index(catalog, table, name, definition, constraint_name)?,
            }
        }
        IndexKind::Group => {
            tracing::debug!(
                event = "index_classified",
                kind = "group",
                table = %table,
                index = name
            );
            let index = build_group_index(catalog, table, name, definition)?;
            let group = catalog
                .table(table)
                .and_then(|table| table.group.clone())
                .ok_or_else(|| PlanError::NoSuchGroup {
                    table: table.clone(),
                })?;
            BuiltIndex {
                owner: IndexOwner::Group(group),
                index,
            }
        }
    };

    // Key columns must be in place before the spatial shape can be checked.
    if built.index.is_spatial() && !catalog.is_spatial_compatible(&built.index) {
        return Err(PlanError::BadSpatialIndex {
            table: table.clone(),
            index: name.to_string(),
        });
    }
    Ok(built)
}

/// Stores `built` on its owning table or group in `catalog`.
pub fn attach(catalog: &mut Catalog, built: BuiltIndex) -> Result<()> {
    match built.owner {
        IndexOwner::Table(table) => {
            let target = catalog
                .table_mut(&table)
                .ok_or_else(|| PlanError::NoSuchTable {
                    table: table.clone(),
                })?;
            if target.index(&built.index.name).is_some() {
                return Err(PlanError::DuplicateIndex {
                    table,
                    index: built.index.name,
                });
            }
            target.indexes.push(built.index);
        }
        IndexOwner::Group(group) => {
            let target = catalog
                .group_mut(&group)
                .ok_or_else(|| PlanError::NoSuchGroup {
                    table: group.clone(),
                })?;
            if target.index(&built.index.name).is_some() {
                return Err(PlanError::DuplicateIndex {
                    table: group,
                    index: built.index.name,
                });
            }
            target.indexes.push(built.index);
        }
    }
    Ok(())
}

/// Plans `CREATE INDEX`. Returns `None` when `IF NOT EXISTS` finds the name taken.
pub fn plan_create_index(
    catalog: &Catalog,
    default_schema: &str,
    request: &CreateIndexRequest,
    names: &mut dyn NameGenerator,
) -> Result<Option<BuiltIndex>> {
    let table = request.table.resolve(default_schema);
    if catalog.table(&table).is_none() {
        return Err(PlanError::NoSuchTable { table });
    }
    let definition = &request.index;
    let first = definition
        .columns
        .first()
        .ok_or_else(|| PlanError::unsupported("index without key columns"))?;
    let name = match &definition.name {
        Some(name) => name.clone(),
        None => names.index_name(&table, &first.column),
    };

    let taken = catalog
        .table(&table)
        .is_some_and(|target| target.index(&name).is_some())
        || catalog
            .group_of(&table)
            .is_some_and(|group| group.index(&name).is_some());
    if taken {
        request.existence.tolerate(PlanError::DuplicateIndex {
            table: table.clone(),
            index: name,
        })?;
        return Ok(None);
    }

    let constraint_name = definition
        .unique
        .then(|| names.unique_constraint_name(&table, &name));
    let built = build_index(catalog, &table, &name, definition, constraint_name)?;
    tracing::info!(
        event = "index_planned",
        table = %table,
        index = %built.index.name,
        kind = ?built.index.kind,
        columns = built.index.columns.len()
    );
    Ok(Some(built))
}

/// Plans and hands a new index to the create-indexes capability.
pub fn execute_create_index(
    ddl: &mut dyn DdlFunctions,
    default_schema: &str,
    request: &CreateIndexRequest,
    names: &mut dyn NameGenerator,
) -> Result<Option<BuiltIndex>> {
    let planned = plan_create_index(ddl.catalog(), default_schema, request, names)?;
    if let Some(built) = &planned {
        ddl.create_indexes(vec![built.clone()])?;
    }
    Ok(planned)
}

/// Resolved target of a `DROP INDEX`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "owner", rename_all = "snake_case")]
pub enum DropIndexPlan {
    Table { table: TableName, indexes: Vec<String> },
    Group { group: TableName, indexes: Vec<String> },
}

/// Resolves the index a `DROP INDEX` names.
///
/// With a table, the name is looked up on the table and on its group and
/// must not be on both. Without one, every table (optionally within one
/// schema) and every group is searched and at most one may match.
pub fn plan_drop_index(
    catalog: &Catalog,
    default_schema: &str,
    request: &DropIndexRequest,
) -> Result<Option<DropIndexPlan>> {
    let name = request.name.as_str();
    let mut table_name: Option<TableName> = None;
    let mut group_name: Option<TableName> = None;

    if let Some(qualified) = &request.table {
        let resolved = qualified.resolve(default_schema);
        let Some(table) = catalog.table(&resolved) else {
            request
                .existence
                .tolerate(PlanError::NoSuchTable { table: resolved })?;
            return Ok(None);
        };
        if table.index(name).is_some() {
            table_name = Some(resolved.clone());
        }
        if let Some(group) = catalog.group_of(&resolved) {
            if group.index(name).is_some() {
                if table_name.is_some() {
                    return Err(PlanError::IndistinguishableIndex {
                        index: name.to_string(),
                    });
                }
                group_name = Some(group.name.clone());
            }
        }
    } else {
        for table in &catalog.tables {
            if let Some(schema) = &request.schema {
                if !table.name.schema.eq_ignore_ascii_case(schema) {
                    continue;
                }
            }
            if table.index(name).is_some() {
                if table_name.is_some() {
                    return Err(PlanError::IndistinguishableIndex {
                        index: name.to_string(),
                    });
                }
                table_name = Some(table.name.clone());
            }
        }
        for group in &catalog.groups {
            if group.index(name).is_some() {
                if table_name.is_some() || group_name.is_some() {
                    return Err(PlanError::IndistinguishableIndex {
                        index: name.to_string(),
                    });
                }
                group_name = Some(group.name.clone());
            }
        }
    }

    let indexes = vec![name.to_string()];
    match (group_name, table_name) {
        (Some(group), _) => Ok(Some(DropIndexPlan::Group { group, indexes })),
        (None, Some(table)) => Ok(Some(DropIndexPlan::Table { table, indexes })),
        (None, None) => {
            request.existence.tolerate(PlanError::NoSuchIndex {
                index: name.to_string(),
            })?;
            Ok(None)
        }
    }
}

/// Resolves a `DROP INDEX` and hands it to the matching drop capability.
pub fn execute_drop_index(
    ddl: &mut dyn DdlFunctions,
    default_schema: &str,
    request: &DropIndexRequest,
) -> Result<Option<DropIndexPlan>> {
    let planned = plan_drop_index(ddl.catalog(), default_schema, request)?;
    match &planned {
        Some(DropIndexPlan::Table { table, indexes }) => ddl.drop_table_indexes(table, indexes)?,
        Some(DropIndexPlan::Group { group, indexes }) => ddl.drop_group_indexes(group, indexes)?,
        None => {}
    }
    Ok(planned)
}
