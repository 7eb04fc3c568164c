//! Raw model metadata matching the JSON model file (and produced by database introspection).

use serde::{Deserialize, Serialize};

pub const DEFAULT_SCHEMA: &str = "public";

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_true() -> bool {
    true
}

/// All record types of one store model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Schema assumed for tables that do not name one, and for unqualified table lookups.
    #[serde(default = "default_schema")]
    pub default_schema: String,
    #[serde(default)]
    pub record_types: Vec<RecordTypeConfig>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            default_schema: default_schema(),
            record_types: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordTypeConfig {
    /// Simple type name, e.g. "Customer".
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub table: String,
    #[serde(default)]
    pub schema: Option<String>,
    /// Base record type for inheritance hierarchies.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub discriminator: Option<DiscriminatorConfig>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// Column distinguishing record types that share one table, and this type's value in it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscriminatorConfig {
    pub column: String,
    pub value: DiscriminatorValue,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiscriminatorValue {
    Int(i64),
    Text(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    /// Physical column; defaults to the field name.
    #[serde(default)]
    pub column: Option<String>,
    /// Scalar type name, e.g. "text", "bigint", "timestamptz". Absent for navigations.
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub navigation: Option<NavigationConfig>,
    #[serde(default = "default_true")]
    pub nullable: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavigationConfig {
    pub target: String,
    /// Collection reference (to-many) when true.
    #[serde(default)]
    pub many: bool,
}

impl FieldConfig {
    pub fn scalar(name: &str, type_name: &str) -> Self {
        FieldConfig {
            name: name.to_string(),
            column: None,
            type_: Some(type_name.to_string()),
            navigation: None,
            nullable: true,
        }
    }

    pub fn navigation(name: &str, target: &str, many: bool) -> Self {
        FieldConfig {
            name: name.to_string(),
            column: None,
            type_: None,
            navigation: Some(NavigationConfig {
                target: target.to_string(),
                many,
            }),
            nullable: true,
        }
    }
}
