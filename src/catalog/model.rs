//! Immutable schema catalog: record types, their table mappings and field descriptors.

use crate::case::eq_ignore_case;
use crate::value::{DynamicValue, FieldType};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(FieldType),
    /// Reference to another record type. Never orderable or projectable.
    Navigation { target: String, cardinality: Cardinality },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    /// Physical column the value is read from (the accessor for SQL stores).
    pub column: String,
    pub kind: FieldKind,
    pub nullable: bool,
}

impl FieldDescriptor {
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, FieldKind::Scalar(_))
    }

    pub fn declared_type(&self) -> Option<FieldType> {
        match self.kind {
            FieldKind::Scalar(t) => Some(t),
            FieldKind::Navigation { .. } => None,
        }
    }
}

/// Physical table a record type is stored in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableMapping {
    pub schema: String,
    pub table: String,
    pub record_type: String,
    pub parent_type: Option<String>,
}

impl TableMapping {
    pub fn matches(&self, schema: &str, table: &str) -> bool {
        eq_ignore_case(&self.schema, schema) && eq_ignore_case(&self.table, table)
    }

    pub fn same_table(&self, other: &TableMapping) -> bool {
        self.matches(&other.schema, &other.table)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Discriminator {
    pub column: String,
    pub value: DynamicValue,
}

#[derive(Clone, Debug)]
pub struct RecordType {
    pub name: String,
    pub display_name: String,
    pub parent: Option<String>,
    pub mapping: TableMapping,
    pub discriminator: Option<Discriminator>,
    /// Inherited fields first, then the type's own.
    pub fields: Vec<FieldDescriptor>,
}

impl RecordType {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn scalar_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_scalar())
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Read-only snapshot of every mapped record type. Built once by [`crate::catalog::resolve`] and shared behind an `Arc`.
#[derive(Clone, Debug)]
pub struct SchemaCatalog {
    default_schema: String,
    record_types: Vec<RecordType>,
    by_name: HashMap<String, usize>,
}

impl SchemaCatalog {
    pub(crate) fn new(default_schema: String, record_types: Vec<RecordType>) -> Self {
        let by_name = record_types
            .iter()
            .enumerate()
            .map(|(i, rt)| (rt.name.clone(), i))
            .collect();
        SchemaCatalog {
            default_schema,
            record_types,
            by_name,
        }
    }

    pub fn default_schema(&self) -> &str {
        &self.default_schema
    }

    pub fn record_types(&self) -> &[RecordType] {
        &self.record_types
    }

    /// Exact lookup by simple type name.
    pub fn record_type(&self, name: &str) -> Option<&RecordType> {
        self.by_name.get(name).map(|&i| &self.record_types[i])
    }

    pub fn mappings(&self) -> impl Iterator<Item = &TableMapping> {
        self.record_types.iter().map(|rt| &rt.mapping)
    }

    pub fn parent_of(&self, record: &RecordType) -> Option<&RecordType> {
        record.parent.as_deref().and_then(|p| self.record_type(p))
    }

    /// Transitive base types, nearest first.
    pub fn ancestors<'a>(&'a self, record: &'a RecordType) -> impl Iterator<Item = &'a RecordType> + 'a {
        let mut current = self.parent_of(record);
        let mut remaining = self.record_types.len();
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            let next = current?;
            current = self.parent_of(next);
            Some(next)
        })
    }

    pub fn is_descendant_of(&self, record: &RecordType, ancestor: &RecordType) -> bool {
        self.ancestors(record).any(|a| a.name == ancestor.name)
    }

    /// The record type itself plus every transitive descendant stored in the same table.
    pub fn hierarchy_on_table<'a>(&'a self, record: &'a RecordType) -> Vec<&'a RecordType> {
        let mut out = vec![record];
        out.extend(self.record_types.iter().filter(|rt| {
            rt.mapping.same_table(&record.mapping) && self.is_descendant_of(rt, record)
        }));
        out
    }

    /// Whether the record type's base shares its table, i.e. it is a derived type in a table-per-hierarchy layout.
    pub fn shares_parent_table(&self, record: &RecordType) -> bool {
        self.parent_of(record)
            .map(|p| p.mapping.same_table(&record.mapping))
            .unwrap_or(false)
    }
}
