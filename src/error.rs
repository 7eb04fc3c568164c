//! Typed errors for catalog building, name resolution, plan construction and store execution.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate {kind}: {name}")]
    DuplicateName { kind: &'static str, name: String },
    #[error("inheritance cycle through record type '{0}'")]
    InheritanceCycle(String),
    #[error("catalog load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("no record type is mapped to '{name}'")]
    NotFound { name: String },
    #[error("table '{schema}.{table}' is shared by unrelated record types ({}) and cannot be resolved to one", .candidates.join(", "))]
    AmbiguousMapping {
        schema: String,
        table: String,
        candidates: Vec<String>,
    },
    #[error("{0} is required")]
    InvalidArgument(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryBuildError {
    #[error("field '{field}' does not exist on {record_type}")]
    UnknownField { field: String, record_type: String },
    #[error("field '{field}' on {record_type} is a navigation, not a scalar field")]
    UnsupportedField { field: String, record_type: String },
    #[error("{0} is required")]
    InvalidArgument(&'static str),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("record type '{0}' has no table in this store")]
    UnmappedRecordType(String),
    #[error("decode {field}: {message}")]
    Decode { field: String, message: String },
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Build(#[from] QueryBuildError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl QueryError {
    /// Stable code for the calling layer.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Catalog(_) => "catalog_error",
            QueryError::Resolution(ResolutionError::NotFound { .. }) => "not_found",
            QueryError::Resolution(ResolutionError::AmbiguousMapping { .. }) => "ambiguous_mapping",
            QueryError::Resolution(ResolutionError::InvalidArgument(_)) => "invalid_argument",
            QueryError::Build(QueryBuildError::UnknownField { .. }) => "unknown_field",
            QueryError::Build(QueryBuildError::UnsupportedField { .. }) => "unsupported_field",
            QueryError::Build(QueryBuildError::InvalidArgument(_)) => "invalid_argument",
            QueryError::Store(StoreError::Db(_)) => "database_error",
            QueryError::Store(_) => "store_error",
        }
    }

    /// Identifiers the caller supplied, echoed back for diagnosis. Store internals are never included.
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            QueryError::Resolution(ResolutionError::NotFound { name }) => {
                Some(serde_json::json!({ "name": name }))
            }
            QueryError::Resolution(ResolutionError::AmbiguousMapping { schema, table, candidates }) => {
                Some(serde_json::json!({ "schema": schema, "table": table, "candidates": candidates }))
            }
            QueryError::Build(QueryBuildError::UnknownField { field, record_type })
            | QueryError::Build(QueryBuildError::UnsupportedField { field, record_type }) => {
                Some(serde_json::json!({ "field": field, "record_type": record_type }))
            }
            QueryError::Store(StoreError::Decode { field, .. }) => Some(serde_json::json!({ "field": field })),
            _ => None,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let message = match self {
            QueryError::Store(StoreError::Db(_)) => "database error".to_string(),
            QueryError::Store(StoreError::Decode { field, .. }) => format!("could not decode {}", field),
            other => other.to_string(),
        };
        ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
                details: self.details(),
            },
        }
    }
}
