//! Query engine: the shared catalog snapshot plus the store queries run against.

use crate::catalog::{RecordType, SchemaCatalog};
use crate::error::{QueryBuildError, QueryError, ResolutionError};
use crate::query::{build_dynamic_query, DynamicQuery};
use crate::store::QueryExecutor;
use std::sync::Arc;

#[derive(Clone)]
pub struct QueryEngine<S> {
    catalog: Arc<SchemaCatalog>,
    store: S,
}

impl<S: QueryExecutor> QueryEngine<S> {
    pub fn new(catalog: Arc<SchemaCatalog>, store: S) -> Self {
        QueryEngine { catalog, store }
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// With a schema the name is a table in that schema; without, a table or entity name.
    pub fn resolve_entity_type(&self, name: &str, schema: Option<&str>) -> Result<&RecordType, ResolutionError> {
        self.catalog.resolve_entity_type(name, schema)
    }

    pub fn build_dynamic_query(
        &self,
        record: &RecordType,
        order_field: &str,
        project_field: &str,
        ascending: bool,
    ) -> Result<DynamicQuery<'_, S>, QueryBuildError> {
        build_dynamic_query(&self.store, &self.catalog, record, order_field, project_field, ascending)
    }

    /// Resolve `table_or_entity`, order by one field and project another. Returns the deferred query.
    pub fn query(
        &self,
        table_or_entity: &str,
        order_field: &str,
        project_field: &str,
        ascending: bool,
    ) -> Result<DynamicQuery<'_, S>, QueryError> {
        if table_or_entity.trim().is_empty() {
            return Err(ResolutionError::InvalidArgument("table or entity name").into());
        }
        if order_field.trim().is_empty() {
            return Err(QueryBuildError::InvalidArgument("order field").into());
        }
        if project_field.trim().is_empty() {
            return Err(QueryBuildError::InvalidArgument("project field").into());
        }
        let record = self.catalog.resolve_by_name_or_table(table_or_entity)?;
        Ok(self.build_dynamic_query(record, order_field, project_field, ascending)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{resolve, ModelConfig};
    use crate::store::{MemoryStore, Row};

    fn engine() -> QueryEngine<MemoryStore> {
        let catalog = resolve(
            &serde_json::from_value::<ModelConfig>(serde_json::json!({
                "record_types": [ { "name": "City", "table": "cities", "fields": [
                    { "name": "Name", "type": "text" }, { "name": "Population", "type": "bigint" } ] } ]
            }))
            .unwrap(),
        )
        .unwrap();
        let mut store = MemoryStore::new();
        for (name, population) in [("Lyon", 522_000_i64), ("Paris", 2_100_000), ("Nice", 342_000)] {
            store
                .insert(&catalog, Row::new("City").with("Name", name).with("Population", population))
                .unwrap();
        }
        QueryEngine::new(Arc::new(catalog), store)
    }

    #[tokio::test]
    async fn query_by_table_name_descending() {
        let engine = engine();
        let names = engine.query("CITIES", "Population", "Name", false).unwrap().fetch_all().await.unwrap();
        let names: Vec<&str> = names.iter().filter_map(|v| v.as_str()).collect();
        assert_eq!(names, vec!["Paris", "Lyon", "Nice"]);
    }

    #[tokio::test]
    async fn blank_arguments_are_rejected_before_resolution() {
        let engine = engine();
        let err = engine.query("", "Population", "Name", true).err().unwrap();
        assert_eq!(err.code(), "invalid_argument");
        let err = engine.query("City", "Population", " ", true).err().unwrap();
        assert!(matches!(err, QueryError::Build(QueryBuildError::InvalidArgument("project field"))));
    }

    #[test]
    fn resolve_entity_type_delegates_to_catalog() {
        let engine = engine();
        assert_eq!(engine.resolve_entity_type("cities", Some("public")).unwrap().name, "City");
        assert!(engine.resolve_entity_type("Orders", None).is_err());
    }

    #[tokio::test]
    async fn engine_is_shareable_across_tasks() {
        let engine = Arc::new(engine());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine.query("City", "Name", "Population", true).unwrap().fetch_all().await.unwrap()
                })
            })
            .collect();
        for h in handles {
            let values = h.await.unwrap();
            assert_eq!(values.first().and_then(|v| v.as_i64()), Some(522_000));
        }
    }
}
