//! Runtime settings from environment variables (load `.env` with dotenvy before calling).

use crate::catalog::{load_from_path, load_from_pool, resolve, SchemaCatalog, DEFAULT_SCHEMA};
use crate::error::CatalogError;
use sqlx::PgPool;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub database_url: String,
    /// JSON model file. When unset the catalog is introspected from the database.
    pub catalog_path: Option<PathBuf>,
    pub default_schema: String,
    /// Schemas to introspect.
    pub schemas: Vec<String>,
    pub max_connections: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self, CatalogError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CatalogError> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/catalog".into());
        let catalog_path = lookup("CATALOG_PATH").filter(|s| !s.trim().is_empty()).map(PathBuf::from);
        let default_schema = lookup("CATALOG_DEFAULT_SCHEMA")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SCHEMA.into());
        let schemas = lookup("CATALOG_SCHEMAS")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| vec![default_schema.clone()]);
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(s) => s
                .trim()
                .parse()
                .map_err(|e| CatalogError::Validation(format!("DATABASE_MAX_CONNECTIONS: {}", e)))?,
            None => 5,
        };
        Ok(Settings {
            database_url,
            catalog_path,
            default_schema,
            schemas,
            max_connections,
        })
    }

    /// Model file when configured, otherwise introspection of `schemas`.
    pub async fn load_catalog(&self, pool: &PgPool) -> Result<SchemaCatalog, CatalogError> {
        let config = match &self.catalog_path {
            Some(path) => load_from_path(path).await?,
            None => load_from_pool(pool, &self.schemas, &self.default_schema).await?,
        };
        resolve(&config)
    }
}
