//! Store execution: runs a validated [`QueryPlan`] and returns its projected values in order.

mod memory;
mod postgres;

pub use memory::{MemoryStore, Record, Row};
pub use postgres::{render_select, PgStore, SelectSql};

use crate::error::StoreError;
use crate::query::QueryPlan;
use crate::value::DynamicValue;
use async_trait::async_trait;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Filter, order, then project. Ties keep the store's natural order.
    async fn execute(&self, plan: &QueryPlan) -> Result<Vec<DynamicValue>, StoreError>;
}

#[async_trait]
impl<T: QueryExecutor + ?Sized> QueryExecutor for std::sync::Arc<T> {
    async fn execute(&self, plan: &QueryPlan) -> Result<Vec<DynamicValue>, StoreError> {
        (**self).execute(plan).await
    }
}
