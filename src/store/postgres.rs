//! PostgreSQL store: renders a plan to one parameterized SELECT and decodes the projected column.

use crate::error::StoreError;
use crate::query::{QueryPlan, TypeFilter};
use crate::store::QueryExecutor;
use crate::value::{DynamicValue, FieldType};
use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Postgres, Row};

const VALUE_ALIAS: &str = "value";

/// Quote identifier for PostgreSQL (identifiers come from the catalog only).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

/// Cast applied to the projected column so each declared type decodes to one Rust type.
fn projection_cast(ty: FieldType) -> &'static str {
    match ty {
        FieldType::Integer => "int8",
        FieldType::Float => "float8",
        FieldType::Text | FieldType::Uuid => "text",
        FieldType::Timestamp => "timestamptz",
        FieldType::Boolean => "bool",
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectSql {
    pub sql: String,
    pub params: Vec<DynamicValue>,
}

impl SelectSql {
    fn push_param(&mut self, v: DynamicValue) -> u32 {
        self.params.push(v);
        self.params.len() as u32
    }
}

/// SELECT <projection> FROM <table> [WHERE <discriminator> IN (...)] ORDER BY <order>.
pub fn render_select(plan: &QueryPlan) -> SelectSql {
    let mut q = SelectSql {
        sql: String::new(),
        params: Vec::new(),
    };
    let projection = plan.projection();
    let cast = projection
        .declared_type()
        .map(projection_cast)
        .unwrap_or("text");
    let table = qualified_table(&plan.mapping().schema, &plan.mapping().table);

    let where_clause = match plan.filter() {
        TypeFilter::Types {
            discriminator: Some((column, values)),
            ..
        } if !values.is_empty() => {
            let placeholders: Vec<String> = values
                .iter()
                .map(|v| format!("${}", q.push_param(v.clone())))
                .collect();
            format!(" WHERE {} IN ({})", quoted(column), placeholders.join(", "))
        }
        TypeFilter::Types { record_types, .. } => {
            tracing::warn!(
                record_type = %plan.record_type(),
                types = ?record_types,
                "table is shared with other record types but declares no discriminator; querying all rows"
            );
            String::new()
        }
        TypeFilter::All => String::new(),
    };

    q.sql = format!(
        "SELECT {}::{} AS {} FROM {}{} ORDER BY {} {}",
        quoted(&projection.column),
        cast,
        quoted(VALUE_ALIAS),
        table,
        where_clause,
        quoted(&plan.order().field.column),
        plan.order().direction.as_sql()
    );
    q
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &DynamicValue,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        DynamicValue::Int(n) => query.bind(*n),
        DynamicValue::Float(n) => query.bind(*n),
        DynamicValue::Text(s) => query.bind(s.clone()),
        DynamicValue::Timestamp(t) => query.bind(*t),
        DynamicValue::Bool(b) => query.bind(*b),
        DynamicValue::Null => query.bind(Option::<String>::None),
    }
}

fn decode(row: &PgRow, ty: Option<FieldType>, field: &str) -> Result<DynamicValue, StoreError> {
    let err = |e: sqlx::Error| StoreError::Decode {
        field: field.to_string(),
        message: e.to_string(),
    };
    Ok(match ty {
        Some(FieldType::Integer) => row.try_get::<Option<i64>, _>(VALUE_ALIAS).map_err(err)?.into(),
        Some(FieldType::Float) => row.try_get::<Option<f64>, _>(VALUE_ALIAS).map_err(err)?.into(),
        Some(FieldType::Timestamp) => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(VALUE_ALIAS)
            .map_err(err)?
            .into(),
        Some(FieldType::Boolean) => row.try_get::<Option<bool>, _>(VALUE_ALIAS).map_err(err)?.into(),
        Some(FieldType::Text) | Some(FieldType::Uuid) | None => {
            row.try_get::<Option<String>, _>(VALUE_ALIAS).map_err(err)?.into()
        }
    })
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl QueryExecutor for PgStore {
    async fn execute(&self, plan: &QueryPlan) -> Result<Vec<DynamicValue>, StoreError> {
        let q = render_select(plan);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = bind_value(query, p);
        }
        let rows = query.fetch_all(&self.pool).await?;
        let projection = plan.projection();
        rows.iter()
            .map(|r| decode(r, projection.declared_type(), &projection.name))
            .collect()
    }
}
