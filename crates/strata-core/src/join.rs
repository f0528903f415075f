use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::name::TableName;

/// Column pair of a parent/child join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JoinColumn {
    pub parent: String,
    pub child: String,
}

/// Directed child-to-parent edge that places the child in the parent's group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Join {
    pub name: String,
    pub parent: TableName,
    pub child: TableName,
    pub columns: Vec<JoinColumn>,
}

impl Join {
    pub fn child_columns(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.child.as_str()).collect()
    }

    pub fn parent_columns(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.parent.as_str()).collect()
    }
}
