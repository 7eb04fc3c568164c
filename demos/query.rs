//! Query a table or entity by name: `cargo run --example query -- <table-or-entity> <order-field> <select-field> [asc|desc]`.
//! Catalog comes from CATALOG_PATH (JSON model) or from introspecting CATALOG_SCHEMAS in DATABASE_URL.

use catalog_query::{PgStore, QueryEngine, Settings};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("catalog_query=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (name, order, select) = match args.as_slice() {
        [name, order, select, ..] => (name.as_str(), order.as_str(), select.as_str()),
        _ => {
            eprintln!("usage: query <table-or-entity> <order-field> <select-field> [asc|desc]");
            std::process::exit(2);
        }
    };
    let ascending = !matches!(args.get(3).map(|s| s.to_lowercase()).as_deref(), Some("desc"));

    let settings = Settings::from_env()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;
    let catalog = settings.load_catalog(&pool).await?;
    let engine = QueryEngine::new(Arc::new(catalog), PgStore::new(pool));

    let query = match engine.query(name, order, select, ascending) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&e.to_body())?);
            std::process::exit(1);
        }
    };
    tracing::info!(
        record_type = %query.plan().record_type(),
        table = %query.plan().mapping().qualified_name(),
        "running query"
    );
    for value in query.fetch_all().await? {
        println!("{}", serde_json::to_string(&value)?);
    }
    Ok(())
}
