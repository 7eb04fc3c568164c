//! Dynamic values produced by projections, and the declared scalar types they come from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Declared type of a scalar field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Integer,
    Float,
    Text,
    Timestamp,
    Boolean,
    Uuid,
}

impl FieldType {
    /// Map a PostgreSQL (or model file) type name to a scalar type. None if the type has no scalar representation.
    /// `numeric`/`decimal` map to `Text` so arbitrary-precision values pass through exactly.
    pub fn from_type_name(name: &str) -> Option<FieldType> {
        let lower = name.trim().to_lowercase();
        let base = lower.split('(').next().unwrap_or("").trim();
        Some(match base {
            "smallint" | "int2" | "integer" | "int" | "int4" | "bigint" | "int8" | "serial"
            | "bigserial" | "smallserial" => FieldType::Integer,
            "real" | "float4" | "double precision" | "float8" | "float" => FieldType::Float,
            "numeric" | "decimal" => FieldType::Text,
            "text" | "varchar" | "character varying" | "character" | "char" | "bpchar" | "citext"
            | "name" | "string" | "user-defined" => FieldType::Text,
            "uuid" => FieldType::Uuid,
            "boolean" | "bool" => FieldType::Boolean,
            "date" | "datetime" => FieldType::Timestamp,
            _ if base.starts_with("timestamp") => FieldType::Timestamp,
            _ => return None,
        })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Text => "text",
            FieldType::Timestamp => "timestamp",
            FieldType::Boolean => "boolean",
            FieldType::Uuid => "uuid",
        };
        f.write_str(s)
    }
}

/// A projected field value. Uuid fields surface as `Text`.
#[derive(Clone, Debug, PartialEq)]
pub enum DynamicValue {
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Bool(bool),
    Null,
}

impl DynamicValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DynamicValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynamicValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DynamicValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Ordering used by sort stages. NULL compares greater than every value (PostgreSQL default),
    /// integers and floats compare numerically, otherwise values of different kinds order by kind.
    pub fn sort_cmp(&self, other: &DynamicValue) -> Ordering {
        use DynamicValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Greater,
            (_, Null) => Ordering::Less,
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Int(a), Float(b)) => (*a as f64).total_cmp(b),
            (Float(a), Int(b)) => a.total_cmp(&(*b as f64)),
            (Text(a), Text(b)) => a.cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            (Bool(a), Bool(b)) => a.cmp(b),
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            DynamicValue::Bool(_) => 0,
            DynamicValue::Int(_) | DynamicValue::Float(_) => 1,
            DynamicValue::Text(_) => 2,
            DynamicValue::Timestamp(_) => 3,
            DynamicValue::Null => 4,
        }
    }
}

impl From<i64> for DynamicValue {
    fn from(v: i64) -> Self {
        DynamicValue::Int(v)
    }
}

impl From<i32> for DynamicValue {
    fn from(v: i32) -> Self {
        DynamicValue::Int(v.into())
    }
}

impl From<f64> for DynamicValue {
    fn from(v: f64) -> Self {
        DynamicValue::Float(v)
    }
}

impl From<bool> for DynamicValue {
    fn from(v: bool) -> Self {
        DynamicValue::Bool(v)
    }
}

impl From<&str> for DynamicValue {
    fn from(v: &str) -> Self {
        DynamicValue::Text(v.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(v: String) -> Self {
        DynamicValue::Text(v)
    }
}

impl From<DateTime<Utc>> for DynamicValue {
    fn from(v: DateTime<Utc>) -> Self {
        DynamicValue::Timestamp(v)
    }
}

impl<T: Into<DynamicValue>> From<Option<T>> for DynamicValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(DynamicValue::Null)
    }
}

/// Serializes as the natural JSON value; timestamps as RFC 3339 strings.
impl Serialize for DynamicValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DynamicValue::Int(n) => serializer.serialize_i64(*n),
            DynamicValue::Float(n) => serializer.serialize_f64(*n),
            DynamicValue::Text(s) => serializer.serialize_str(s),
            DynamicValue::Timestamp(t) => serializer.serialize_str(&t.to_rfc3339()),
            DynamicValue::Bool(b) => serializer.serialize_bool(*b),
            DynamicValue::Null => serializer.serialize_none(),
        }
    }
}

impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicValue::Int(n) => write!(f, "{}", n),
            DynamicValue::Float(n) => write!(f, "{}", n),
            DynamicValue::Text(s) => f.write_str(s),
            DynamicValue::Timestamp(t) => f.write_str(&t.to_rfc3339()),
            DynamicValue::Bool(b) => write!(f, "{}", b),
            DynamicValue::Null => f.write_str("null"),
        }
    }
}
