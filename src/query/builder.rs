//! Builds ordered, projected queries for a resolved record type and binds them to a store.

use crate::catalog::{RecordType, SchemaCatalog};
use crate::error::{QueryBuildError, StoreError};
use crate::query::{QueryPlan, SortDirection};
use crate::store::QueryExecutor;
use crate::value::DynamicValue;

/// Validate both fields, then assemble the plan. No store interaction.
pub fn build_query(
    catalog: &SchemaCatalog,
    record: &RecordType,
    order_field: &str,
    project_field: &str,
    ascending: bool,
) -> Result<QueryPlan, QueryBuildError> {
    let plan = QueryPlan::source(catalog, record)
        .order_by(order_field, SortDirection::from_ascending(ascending))?
        .select(project_field)?;
    tracing::debug!(
        record_type = %plan.record_type(),
        table = %plan.mapping().qualified_name(),
        order = %plan.order().field.name,
        direction = plan.order().direction.as_sql(),
        projection = %plan.projection().name,
        "query plan built"
    );
    Ok(plan)
}

/// Deferred query: holds a plan and the store it will run against. Nothing runs until [`DynamicQuery::fetch_all`],
/// which consumes the query.
pub struct DynamicQuery<'s, S: QueryExecutor + ?Sized> {
    plan: QueryPlan,
    store: &'s S,
}

impl<'s, S: QueryExecutor + ?Sized> DynamicQuery<'s, S> {
    pub fn new(plan: QueryPlan, store: &'s S) -> Self {
        DynamicQuery { plan, store }
    }

    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    pub fn into_plan(self) -> QueryPlan {
        self.plan
    }

    /// Run the plan and collect the projected values in order. Dropping the returned future cancels the store call.
    pub async fn fetch_all(self) -> Result<Vec<DynamicValue>, StoreError> {
        self.store.execute(&self.plan).await
    }
}

pub fn build_dynamic_query<'s, S: QueryExecutor + ?Sized>(
    store: &'s S,
    catalog: &SchemaCatalog,
    record: &RecordType,
    order_field: &str,
    project_field: &str,
    ascending: bool,
) -> Result<DynamicQuery<'s, S>, QueryBuildError> {
    let plan = build_query(catalog, record, order_field, project_field, ascending)?;
    Ok(DynamicQuery::new(plan, store))
}
