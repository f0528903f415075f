//! Change descriptors: the column- and index-level deltas of a plan.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Add,
    Drop,
    Modify,
}

/// One atomic edit to a named column or index.
///
/// `Add` carries only a new name, `Drop` only an old name, and `Modify`
/// carries both (equal unless the object is renamed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TableChange {
    pub change_type: ChangeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
}

impl TableChange {
    pub fn create_add(new_name: impl Into<String>) -> Self {
        Self {
            change_type: ChangeType::Add,
            old_name: None,
            new_name: Some(new_name.into()),
        }
    }

    pub fn create_drop(old_name: impl Into<String>) -> Self {
        Self {
            change_type: ChangeType::Drop,
            old_name: Some(old_name.into()),
            new_name: None,
        }
    }

    pub fn create_modify(old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            change_type: ChangeType::Modify,
            old_name: Some(old_name.into()),
            new_name: Some(new_name.into()),
        }
    }
}

/// Severity of a plan, ordered from least to most disruptive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ChangeLevel {
    /// Names or defaults only; no stored data changes shape.
    Metadata,
    /// Row layout or table indexes change.
    Table,
    /// Group membership changes.
    Group,
}

/// Change type of the first entry whose old name is `old_name`.
pub fn find_change_type(changes: &[TableChange], old_name: &str) -> Option<ChangeType> {
    changes
        .iter()
        .find(|change| change.old_name.as_deref() == Some(old_name))
        .map(|change| change.change_type)
}

/// Name `old_name` carries after `changes`: `None` when dropped, the new
/// name when modified, unchanged otherwise.
pub fn resolve_new_name(changes: &[TableChange], old_name: &str) -> Option<String> {
    match changes
        .iter()
        .find(|change| change.old_name.as_deref() == Some(old_name))
    {
        Some(change) if change.change_type == ChangeType::Drop => None,
        Some(change) => change.new_name.clone(),
        None => Some(old_name.to_string()),
    }
}

/// True if `changes` adds `new_name`.
pub fn is_added(changes: &[TableChange], new_name: &str) -> bool {
    changes.iter().any(|change| {
        change.change_type == ChangeType::Add && change.new_name.as_deref() == Some(new_name)
    })
}
