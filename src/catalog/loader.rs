//! Build the schema catalog from model metadata: a JSON model file or live PostgreSQL introspection.

use crate::case::to_pascal_case;
use crate::catalog::model::{
    Cardinality, Discriminator, FieldDescriptor, FieldKind, RecordType, SchemaCatalog, TableMapping,
};
use crate::catalog::types::*;
use crate::catalog::validate;
use crate::error::CatalogError;
use crate::value::{DynamicValue, FieldType};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Build the immutable catalog from model metadata (validates first).
pub fn resolve(config: &ModelConfig) -> Result<SchemaCatalog, CatalogError> {
    validate(config)?;

    let by_name: HashMap<&str, &RecordTypeConfig> =
        config.record_types.iter().map(|rt| (rt.name.as_str(), rt)).collect();

    let mut record_types = Vec::with_capacity(config.record_types.len());
    for rt in &config.record_types {
        let mut lineage = vec![rt];
        let mut current = rt;
        while let Some(parent) = current.parent.as_deref() {
            current = by_name
                .get(parent)
                .copied()
                .ok_or_else(|| CatalogError::MissingReference {
                    kind: "parent record type",
                    id: parent.to_string(),
                })?;
            lineage.push(current);
        }

        let fields: Vec<FieldDescriptor> = lineage
            .iter()
            .rev()
            .flat_map(|owner| owner.fields.iter())
            .map(field_descriptor)
            .collect::<Result<_, _>>()?;

        let discriminator = lineage
            .iter()
            .find_map(|owner| owner.discriminator.as_ref())
            .map(|d| d.column.clone())
            .and_then(|column| {
                rt.discriminator.as_ref().map(|d| Discriminator {
                    column,
                    value: match &d.value {
                        DiscriminatorValue::Int(n) => DynamicValue::Int(*n),
                        DiscriminatorValue::Text(s) => DynamicValue::Text(s.clone()),
                    },
                })
            });

        record_types.push(RecordType {
            name: rt.name.clone(),
            display_name: rt.display_name.clone().unwrap_or_else(|| rt.name.clone()),
            parent: rt.parent.clone(),
            mapping: TableMapping {
                schema: rt.schema.clone().unwrap_or_else(|| config.default_schema.clone()),
                table: rt.table.clone(),
                record_type: rt.name.clone(),
                parent_type: rt.parent.clone(),
            },
            discriminator,
            fields,
        });
    }

    let tables: HashSet<(String, String)> = record_types
        .iter()
        .map(|rt| (rt.mapping.schema.to_lowercase(), rt.mapping.table.to_lowercase()))
        .collect();
    tracing::info!(
        record_types = record_types.len(),
        tables = tables.len(),
        default_schema = %config.default_schema,
        "schema catalog built"
    );
    Ok(SchemaCatalog::new(config.default_schema.clone(), record_types))
}

fn field_descriptor(f: &FieldConfig) -> Result<FieldDescriptor, CatalogError> {
    let kind = match (&f.type_, &f.navigation) {
        (Some(ty), None) => FieldKind::Scalar(FieldType::from_type_name(ty).ok_or_else(|| {
            CatalogError::Validation(format!("{}: unsupported scalar type '{}'", f.name, ty))
        })?),
        (None, Some(nav)) => FieldKind::Navigation {
            target: nav.target.clone(),
            cardinality: if nav.many { Cardinality::Many } else { Cardinality::One },
        },
        _ => {
            return Err(CatalogError::Validation(format!(
                "{}: field must declare exactly one of type or navigation",
                f.name
            )))
        }
    };
    Ok(FieldDescriptor {
        name: f.name.clone(),
        column: f.column.clone().unwrap_or_else(|| f.name.clone()),
        kind,
        nullable: f.nullable,
    })
}

/// Read a JSON model file.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<ModelConfig, CatalogError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CatalogError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&text).map_err(|e| CatalogError::Load(format!("{}: {}", path.display(), e)))
}

/// Introspect base tables of the given schemas. One record type per table, scalar fields from columns,
/// navigations from foreign keys (to-one on the referencing side, to-many on the referenced side).
pub async fn load_from_pool(
    pool: &PgPool,
    schemas: &[String],
    default_schema: &str,
) -> Result<ModelConfig, CatalogError> {
    let columns_sql = r#"
        SELECT c.table_schema::text, c.table_name::text, c.column_name::text, c.data_type::text, (c.is_nullable = 'YES')
        FROM information_schema.columns c
        JOIN information_schema.tables t
          ON t.table_schema = c.table_schema AND t.table_name = c.table_name
        WHERE t.table_type = 'BASE TABLE' AND c.table_schema = ANY($1)
        ORDER BY c.table_schema, c.table_name, c.ordinal_position
    "#;
    tracing::debug!(sql = %columns_sql, schemas = ?schemas, "query");
    let columns = sqlx::query_as::<_, (String, String, String, String, bool)>(columns_sql)
        .bind(schemas)
        .fetch_all(pool)
        .await
        .map_err(|e| CatalogError::Load(e.to_string()))?;

    let fk_sql = r#"
        SELECT DISTINCT tc.table_schema::text, tc.table_name::text, ccu.table_schema::text, ccu.table_name::text
        FROM information_schema.table_constraints tc
        JOIN information_schema.constraint_column_usage ccu
          ON ccu.constraint_schema = tc.constraint_schema AND ccu.constraint_name = tc.constraint_name
        WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_schema = ANY($1)
        ORDER BY 1, 2, 3, 4
    "#;
    tracing::debug!(sql = %fk_sql, schemas = ?schemas, "query");
    let foreign_keys = sqlx::query_as::<_, (String, String, String, String)>(fk_sql)
        .bind(schemas)
        .fetch_all(pool)
        .await
        .map_err(|e| CatalogError::Load(e.to_string()))?;

    Ok(model_from_introspection(default_schema, &columns, &foreign_keys))
}

/// (schema, table, column, data_type, nullable)
type ColumnRow = (String, String, String, String, bool);
/// (from_schema, from_table, to_schema, to_table)
type ForeignKeyRow = (String, String, String, String);

fn model_from_introspection(
    default_schema: &str,
    columns: &[ColumnRow],
    foreign_keys: &[ForeignKeyRow],
) -> ModelConfig {
    let mut record_types: Vec<RecordTypeConfig> = Vec::new();
    let mut index_by_table: HashMap<(String, String), usize> = HashMap::new();

    let mut table_counts: HashMap<&str, usize> = HashMap::new();
    let mut seen_tables = HashSet::new();
    for (schema, table, ..) in columns {
        if seen_tables.insert((schema.as_str(), table.as_str())) {
            *table_counts.entry(table.as_str()).or_default() += 1;
        }
    }
    let type_name = |schema: &str, table: &str| -> String {
        if table_counts.get(table).copied().unwrap_or(0) > 1 {
            format!("{}{}", to_pascal_case(schema), to_pascal_case(table))
        } else {
            to_pascal_case(table)
        }
    };

    for (schema, table, column, data_type, nullable) in columns {
        let key = (schema.clone(), table.clone());
        let idx = *index_by_table.entry(key).or_insert_with(|| {
            record_types.push(RecordTypeConfig {
                name: type_name(schema, table),
                display_name: None,
                table: table.clone(),
                schema: Some(schema.clone()),
                parent: None,
                discriminator: None,
                fields: Vec::new(),
            });
            record_types.len() - 1
        });
        if FieldType::from_type_name(data_type).is_none() {
            tracing::warn!(schema = %schema, table = %table, column = %column, data_type = %data_type, "skipping column of unsupported type");
            continue;
        }
        let mut field = FieldConfig::scalar(column, data_type);
        field.nullable = *nullable;
        record_types[idx].fields.push(field);
    }

    for (from_schema, from_table, to_schema, to_table) in foreign_keys {
        let from = index_by_table.get(&(from_schema.clone(), from_table.clone())).copied();
        let to = index_by_table.get(&(to_schema.clone(), to_table.clone())).copied();
        let (Some(from), Some(to)) = (from, to) else {
            continue;
        };
        let to_name = record_types[to].name.clone();
        let from_name = record_types[from].name.clone();
        push_navigation(&mut record_types[from], FieldConfig::navigation(&to_name, &to_name, false));
        push_navigation(&mut record_types[to], FieldConfig::navigation(&from_name, &from_name, true));
    }

    ModelConfig {
        default_schema: default_schema.to_string(),
        record_types,
    }
}

fn push_navigation(rt: &mut RecordTypeConfig, field: FieldConfig) {
    if rt.fields.iter().any(|f| f.name == field.name) {
        tracing::debug!(record_type = %rt.name, field = %field.name, "navigation name already taken, skipped");
        return;
    }
    rt.fields.push(field);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people_model() -> ModelConfig {
        serde_json::from_value(serde_json::json!({
            "default_schema": "dbo",
            "record_types": [
                { "name": "Person", "table": "People", "discriminator": { "column": "Kind", "value": "person" },
                  "fields": [ { "name": "Name", "type": "text" }, { "name": "Born", "column": "born_at", "type": "timestamptz" } ] },
                { "name": "Employee", "table": "People", "parent": "Person", "discriminator": { "column": "Kind", "value": "employee" },
                  "fields": [ { "name": "Salary", "type": "numeric" } ] },
                { "name": "Manager", "table": "People", "parent": "Employee", "discriminator": { "column": "Kind", "value": "manager" },
                  "fields": [ { "name": "Reports", "navigation": { "target": "Employee", "many": true } } ] }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn derived_types_inherit_fields_in_base_first_order() {
        let catalog = resolve(&people_model()).unwrap();
        let manager = catalog.record_type("Manager").unwrap();
        let names: Vec<&str> = manager.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Name", "Born", "Salary", "Reports"]);
        assert_eq!(manager.field("Born").unwrap().column, "born_at");
        assert!(!manager.field("Reports").unwrap().is_scalar());
    }

    #[test]
    fn mappings_default_to_model_schema_and_record_parent() {
        let catalog = resolve(&people_model()).unwrap();
        let employee = catalog.record_type("Employee").unwrap();
        assert_eq!(employee.mapping.schema, "dbo");
        assert_eq!(employee.mapping.parent_type.as_deref(), Some("Person"));
        assert_eq!(
            employee.discriminator,
            Some(Discriminator {
                column: "Kind".into(),
                value: DynamicValue::Text("employee".into())
            })
        );
    }

    #[test]
    fn hierarchy_on_table_is_transitive() {
        let catalog = resolve(&people_model()).unwrap();
        let person = catalog.record_type("Person").unwrap();
        let names: Vec<&str> = catalog.hierarchy_on_table(person).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Person", "Employee", "Manager"]);
        let manager = catalog.record_type("Manager").unwrap();
        assert_eq!(catalog.hierarchy_on_table(manager).len(), 1);
        assert!(catalog.shares_parent_table(manager));
        assert!(!catalog.shares_parent_table(person));
    }

    #[test]
    fn introspection_builds_types_fields_and_navigations() {
        let col = |s: &str, t: &str, c: &str, ty: &str| (s.to_string(), t.to_string(), c.to_string(), ty.to_string(), true);
        let columns = vec![
            col("public", "customers", "id", "bigint"),
            col("public", "customers", "last_name", "text"),
            col("public", "customers", "profile", "jsonb"),
            col("public", "orders", "id", "bigint"),
            col("public", "orders", "customer_id", "bigint"),
            col("public", "orders", "placed_at", "timestamp with time zone"),
        ];
        let fks = vec![("public".to_string(), "orders".to_string(), "public".to_string(), "customers".to_string())];
        let config = model_from_introspection("public", &columns, &fks);
        let catalog = resolve(&config).unwrap();

        let customers = catalog.record_type("Customers").unwrap();
        assert!(customers.field("profile").is_none());
        assert_eq!(customers.field("last_name").unwrap().declared_type(), Some(FieldType::Text));
        assert_eq!(
            customers.field("Orders").unwrap().kind,
            FieldKind::Navigation { target: "Orders".into(), cardinality: Cardinality::Many }
        );
        let orders = catalog.record_type("Orders").unwrap();
        assert_eq!(
            orders.field("Customers").unwrap().kind,
            FieldKind::Navigation { target: "Customers".into(), cardinality: Cardinality::One }
        );
        assert_eq!(orders.field("placed_at").unwrap().declared_type(), Some(FieldType::Timestamp));
    }

    #[test]
    fn introspection_qualifies_type_names_for_tables_in_several_schemas() {
        let col = |s: &str| (s.to_string(), "events".to_string(), "id".to_string(), "integer".to_string(), false);
        let config = model_from_introspection("public", &[col("public"), col("audit")], &[]);
        let names: Vec<&str> = config.record_types.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["PublicEvents", "AuditEvents"]);
        resolve(&config).unwrap();
    }

    #[tokio::test]
    async fn load_from_path_reports_missing_file() {
        let err = load_from_path("/nonexistent/catalog-model.json").await.unwrap_err();
        assert!(matches!(err, CatalogError::Load(_)));
    }
}
