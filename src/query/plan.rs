//! Staged plan construction: source (with type filter) -> order -> projection.
//! Only a fully projected [`QueryPlan`] can be executed.

use crate::catalog::{FieldDescriptor, RecordType, SchemaCatalog, TableMapping};
use crate::error::QueryBuildError;
use crate::value::DynamicValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// Rows of the physical table that belong to the queried record type.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeFilter {
    /// Every row of the table.
    All,
    /// Rows whose concrete type is one of `record_types`. `discriminator` carries the column and the
    /// values of those types when the table declares one.
    Types {
        record_types: Vec<String>,
        discriminator: Option<(String, Vec<DynamicValue>)>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderSpec {
    pub field: FieldDescriptor,
    pub direction: SortDirection,
}

/// A record type's row source with its type filter applied.
#[derive(Clone, Debug)]
pub struct SourcePlan<'c> {
    record: &'c RecordType,
    filter: TypeFilter,
}

#[derive(Clone, Debug)]
pub struct OrderedPlan<'c> {
    source: SourcePlan<'c>,
    order: OrderSpec,
}

/// Immutable description of one ordered, projected query. Built per call and consumed by execution.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryPlan {
    record_type: String,
    mapping: TableMapping,
    filter: TypeFilter,
    order: OrderSpec,
    projection: FieldDescriptor,
}

impl QueryPlan {
    pub fn source<'c>(catalog: &'c SchemaCatalog, record: &'c RecordType) -> SourcePlan<'c> {
        SourcePlan {
            record,
            filter: type_filter(catalog, record),
        }
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn mapping(&self) -> &TableMapping {
        &self.mapping
    }

    pub fn filter(&self) -> &TypeFilter {
        &self.filter
    }

    pub fn order(&self) -> &OrderSpec {
        &self.order
    }

    pub fn projection(&self) -> &FieldDescriptor {
        &self.projection
    }
}

impl<'c> SourcePlan<'c> {
    pub fn record(&self) -> &'c RecordType {
        self.record
    }

    pub fn filter(&self) -> &TypeFilter {
        &self.filter
    }

    pub fn order_by(self, field: &str, direction: SortDirection) -> Result<OrderedPlan<'c>, QueryBuildError> {
        if field.trim().is_empty() {
            return Err(QueryBuildError::InvalidArgument("order field"));
        }
        let field = scalar_field(self.record, field)?.clone();
        Ok(OrderedPlan {
            source: self,
            order: OrderSpec { field, direction },
        })
    }
}

impl<'c> OrderedPlan<'c> {
    pub fn order(&self) -> &OrderSpec {
        &self.order
    }

    pub fn select(self, field: &str) -> Result<QueryPlan, QueryBuildError> {
        if field.trim().is_empty() {
            return Err(QueryBuildError::InvalidArgument("project field"));
        }
        let record = self.source.record;
        let projection = scalar_field(record, field)?.clone();
        Ok(QueryPlan {
            record_type: record.name.clone(),
            mapping: record.mapping.clone(),
            filter: self.source.filter,
            order: self.order,
            projection,
        })
    }
}

/// Field lookup for ordering or projection: must exist and be scalar.
pub fn scalar_field<'r>(record: &'r RecordType, name: &str) -> Result<&'r FieldDescriptor, QueryBuildError> {
    let field = record.field(name).ok_or_else(|| QueryBuildError::UnknownField {
        field: name.to_string(),
        record_type: record.display_name.clone(),
    })?;
    if !field.is_scalar() {
        return Err(QueryBuildError::UnsupportedField {
            field: name.to_string(),
            record_type: record.display_name.clone(),
        });
    }
    Ok(field)
}

/// No filter when the record type and its descendants are the only types stored in the table.
fn type_filter(catalog: &SchemaCatalog, record: &RecordType) -> TypeFilter {
    let hierarchy = catalog.hierarchy_on_table(record);
    let others_on_table = catalog
        .record_types()
        .iter()
        .filter(|rt| rt.mapping.same_table(&record.mapping))
        .any(|rt| !hierarchy.iter().any(|h| h.name == rt.name));
    if !others_on_table {
        return TypeFilter::All;
    }
    let discriminator = record
        .discriminator
        .as_ref()
        .or_else(|| hierarchy.iter().find_map(|h| h.discriminator.as_ref()))
        .map(|d| {
            let values = hierarchy
                .iter()
                .filter_map(|h| h.discriminator.as_ref().map(|d| d.value.clone()))
                .collect::<Vec<_>>();
            (d.column.clone(), values)
        });
    TypeFilter::Types {
        record_types: hierarchy.iter().map(|h| h.name.clone()).collect(),
        discriminator,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{resolve, ModelConfig};

    fn people() -> SchemaCatalog {
        let config: ModelConfig = serde_json::from_value(serde_json::json!({
            "record_types": [
                { "name": "Person", "table": "people", "discriminator": { "column": "kind", "value": "P" },
                  "fields": [ { "name": "Name", "type": "text" }, { "name": "Friends", "navigation": { "target": "Person", "many": true } } ] },
                { "name": "Employee", "table": "people", "parent": "Person", "discriminator": { "column": "kind", "value": "E" },
                  "fields": [ { "name": "Salary", "type": "numeric" } ] },
                { "name": "Manager", "table": "people", "parent": "Employee", "discriminator": { "column": "kind", "value": "M" } },
                { "name": "Customer", "table": "customers", "fields": [ { "name": "Email", "type": "text" } ] }
            ]
        }))
        .unwrap();
        resolve(&config).unwrap()
    }

    #[test]
    fn root_of_table_needs_no_filter() {
        let c = people();
        let person = c.record_type("Person").unwrap();
        assert_eq!(QueryPlan::source(&c, person).filter(), &TypeFilter::All);
        let customer = c.record_type("Customer").unwrap();
        assert_eq!(QueryPlan::source(&c, customer).filter(), &TypeFilter::All);
    }

    #[test]
    fn derived_type_filters_to_itself_and_descendants() {
        let c = people();
        let employee = c.record_type("Employee").unwrap();
        assert_eq!(
            QueryPlan::source(&c, employee).filter(),
            &TypeFilter::Types {
                record_types: vec!["Employee".into(), "Manager".into()],
                discriminator: Some(("kind".into(), vec!["E".into(), "M".into()])),
            }
        );
    }

    #[test]
    fn staged_plan_carries_order_and_projection() {
        let c = people();
        let employee = c.record_type("Employee").unwrap();
        let plan = QueryPlan::source(&c, employee)
            .order_by("Salary", SortDirection::Descending)
            .unwrap()
            .select("Name")
            .unwrap();
        assert_eq!(plan.record_type(), "Employee");
        assert_eq!(plan.mapping().table, "people");
        assert_eq!(plan.order().field.name, "Salary");
        assert_eq!(plan.order().direction, SortDirection::Descending);
        assert_eq!(plan.projection().name, "Name");
    }

    #[test]
    fn navigation_and_unknown_fields_are_rejected() {
        let c = people();
        let person = c.record_type("Person").unwrap();
        assert_eq!(
            QueryPlan::source(&c, person).order_by("Friends", SortDirection::Ascending).unwrap_err(),
            QueryBuildError::UnsupportedField { field: "Friends".into(), record_type: "Person".into() }
        );
        let ordered = QueryPlan::source(&c, person).order_by("Name", SortDirection::Ascending).unwrap();
        assert_eq!(
            ordered.select("Salary").unwrap_err(),
            QueryBuildError::UnknownField { field: "Salary".into(), record_type: "Person".into() }
        );
    }

    #[test]
    fn blank_fields_are_invalid_arguments() {
        let c = people();
        let person = c.record_type("Person").unwrap();
        assert_eq!(
            QueryPlan::source(&c, person).order_by(" ", SortDirection::Ascending).unwrap_err(),
            QueryBuildError::InvalidArgument("order field")
        );
    }
}
