//! Core contracts and helpers for Strata.
//!
//! This crate defines the canonical catalog model (groups, tables, columns,
//! indexes, joins and sequences), catalog validation, and the group-tree
//! report shared by the planner and the CLI.

pub mod builder;
pub mod error;
pub mod graph;
pub mod index;
pub mod join;
pub mod name;
pub mod schema;
pub mod types;
pub mod validation;

pub use builder::{CatalogBuilder, TableBuilder};
pub use error::{Error, Result};
pub use graph::{
    GroupMember, GroupTree, JoinGraphReport, JoinGraphSummary, build_group_tree,
    build_join_graph_report,
};
pub use index::{Index, IndexColumn, IndexConstraint, IndexJoinType, IndexKind, SpatialRange};
pub use join::{Join, JoinColumn};
pub use name::TableName;
pub use schema::{Catalog, Column, Group, Sequence, Table};
pub use types::{ColumnDefault, ColumnIdentity, ColumnType, IdentityGeneration};
pub use validation::validate_catalog;

/// Current contract version for `catalog.json` artifacts.
pub const CATALOG_VERSION: &str = "0.1";
