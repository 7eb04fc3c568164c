//! Catalog query: resolve record types by table or entity name and run ordered, projected queries
//! against them without compile-time knowledge of the concrete types.

pub mod case;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod query;
pub mod settings;
pub mod store;
pub mod value;

pub use catalog::{load_from_path, load_from_pool, resolve, ModelConfig, RecordType, SchemaCatalog};
pub use engine::QueryEngine;
pub use error::{CatalogError, QueryBuildError, QueryError, ResolutionError, StoreError};
pub use query::{build_dynamic_query, build_query, DynamicQuery, QueryPlan, SortDirection};
pub use settings::Settings;
pub use store::{MemoryStore, PgStore, QueryExecutor, Record, Row};
pub use value::{DynamicValue, FieldType};
