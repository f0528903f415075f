use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::name::TableName;

/// Logical column type with its optional parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnType {
    /// Lower-case type name (e.g. `bigint`, `varchar`, `decimal`).
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
}

impl ColumnType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            length: None,
            precision: None,
            scale: None,
        }
    }

    pub fn int() -> Self {
        Self::new("int")
    }

    pub fn bigint() -> Self {
        Self::new("bigint")
    }

    pub fn varchar(length: u32) -> Self {
        Self {
            length: Some(length),
            ..Self::new("varchar")
        }
    }

    pub fn decimal(precision: u32, scale: u32) -> Self {
        Self {
            precision: Some(precision),
            scale: Some(scale),
            ..Self::new("decimal")
        }
    }

    /// Returns true for exact and approximate numeric types.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.name.as_str(),
            "tinyint"
                | "smallint"
                | "int"
                | "integer"
                | "bigint"
                | "decimal"
                | "numeric"
                | "real"
                | "float"
                | "double"
                | "double precision"
        )
    }

    /// Returns true for the `SERIAL` shorthands that imply an identity column.
    pub fn is_serial(&self) -> bool {
        matches!(self.name.as_str(), "serial" | "bigserial")
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.length, self.precision, self.scale) {
            (Some(length), _, _) => write!(f, "{}({})", self.name, length),
            (None, Some(precision), Some(scale)) => {
                write!(f, "{}({}, {})", self.name, precision, scale)
            }
            (None, Some(precision), None) => write!(f, "{}({})", self.name, precision),
            _ => f.write_str(&self.name),
        }
    }
}

/// Identity generation strategy for `GENERATED ... AS IDENTITY` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IdentityGeneration {
    Always,
    ByDefault,
}

/// Binding of an identity column to the sequence that feeds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnIdentity {
    pub sequence: TableName,
    pub generation: IdentityGeneration,
}

/// Column default, either a literal value or a niladic function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ColumnDefault {
    Value(String),
    Function(String),
}
