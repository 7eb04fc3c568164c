//! In-process store: records registered per physical table, kept in insertion order.

use crate::catalog::{SchemaCatalog, TableMapping};
use crate::error::StoreError;
use crate::query::{QueryPlan, SortDirection, TypeFilter};
use crate::store::QueryExecutor;
use crate::value::DynamicValue;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// A stored record: reports its concrete record type and exposes scalar field values by name.
/// Implement it for a concrete struct to make that type orderable and projectable.
pub trait Record: Send + Sync {
    fn type_name(&self) -> &str;
    fn value(&self, field: &str) -> Option<DynamicValue>;
}

/// Untyped record: a type name and a bag of field values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    pub type_name: String,
    pub values: HashMap<String, DynamicValue>,
}

impl Row {
    pub fn new(type_name: &str) -> Self {
        Row {
            type_name: type_name.to_string(),
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, field: &str, value: impl Into<DynamicValue>) -> Self {
        self.values.insert(field.to_string(), value.into());
        self
    }
}

impl Record for Row {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn value(&self, field: &str) -> Option<DynamicValue> {
        self.values.get(field).cloned()
    }
}

fn table_key(mapping: &TableMapping) -> (String, String) {
    (mapping.schema.to_lowercase(), mapping.table.to_lowercase())
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: HashMap<(String, String), Vec<Arc<dyn Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Store a record in the table its record type is mapped to.
    pub fn insert<R: Record + 'static>(&mut self, catalog: &SchemaCatalog, record: R) -> Result<(), StoreError> {
        let rt = catalog
            .record_type(record.type_name())
            .ok_or_else(|| StoreError::UnmappedRecordType(record.type_name().to_string()))?;
        self.tables
            .entry(table_key(&rt.mapping))
            .or_default()
            .push(Arc::new(record));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl QueryExecutor for MemoryStore {
    async fn execute(&self, plan: &QueryPlan) -> Result<Vec<DynamicValue>, StoreError> {
        let Some(rows) = self.tables.get(&table_key(plan.mapping())) else {
            return Ok(Vec::new());
        };
        let order = &plan.order().field.name;
        let projection = &plan.projection().name;

        let mut keyed: Vec<(DynamicValue, DynamicValue)> = rows
            .iter()
            .filter(|r| match plan.filter() {
                TypeFilter::All => true,
                TypeFilter::Types { record_types, .. } => record_types.iter().any(|t| t == r.type_name()),
            })
            .map(|r| {
                (
                    r.value(order).unwrap_or(DynamicValue::Null),
                    r.value(projection).unwrap_or(DynamicValue::Null),
                )
            })
            .collect();

        // sort_by is stable: equal keys keep insertion order in both directions
        match plan.order().direction {
            SortDirection::Ascending => keyed.sort_by(|a, b| a.0.sort_cmp(&b.0)),
            SortDirection::Descending => keyed.sort_by(|a, b| b.0.sort_cmp(&a.0)),
        }
        Ok(keyed.into_iter().map(|(_, v)| v).collect())
    }
}
