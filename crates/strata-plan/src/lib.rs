//! Alteration planning for Strata catalogs.
//!
//! The planner turns typed DDL requests into change descriptors and a
//! working copy of the affected group. Commit is delegated to a
//! [`DdlFunctions`] implementation; [`CatalogDdl`] applies plans to an
//! in-memory catalog.

pub mod alter;
pub mod cascade;
pub mod change;
pub mod copy;
pub mod ddl;
pub mod errors;
pub mod index;
pub mod naming;
pub mod request;
pub mod validate;

pub use alter::{
    AlterOutcome, AlterationPlan, PlannerOptions, execute_alter_table, plan_alter_table,
};
pub use cascade::{
    JoinCascade, RebuiltIndex, cascade_joins, copy_group_indexes, copy_table_indexes, rebuild_index,
};
pub use change::{ChangeLevel, ChangeType, TableChange};
pub use copy::{add_parent_table, copy_catalog, copy_table};
pub use ddl::{CatalogDdl, DdlFunctions};
pub use errors::{
    ErrorCategory, IssueSeverity, PlanError, Result, ValidationIssue, ValidationReport,
};
pub use index::{
    BuiltIndex, DropIndexPlan, IndexOwner, build_group_index, build_index, build_table_index,
    check_index_type, execute_create_index, execute_drop_index, plan_create_index, plan_drop_index,
};
pub use naming::{DefaultNameGenerator, NameGenerator};
pub use request::{
    AlterTableRequest, ColumnDefinition, ConstraintDefinition, ConstraintKind, CreateIndexRequest,
    DdlRequest, DropConstraintKind, DropIndexRequest, ExistenceCheck, ForeignKeyDefinition,
    GroupingForeignKey, IdentityChange, IdentityDefinition, IndexColumnRef, IndexDefinition,
    QualifiedName, RequestedJoinType, SpatialFunction, SpatialMarker, TableElement,
};
pub use validate::{
    parse_request, request_json_schema, request_json_schema_value, validate_request_against_catalog,
    validate_request_json,
};
