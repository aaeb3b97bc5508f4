//! Store handle setup.

use crate::config::Config;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

/// Schema and seed script run on every startup. Must stay idempotent.
pub const INIT_SCRIPT: &str = include_str!("../sql/init.sql");

pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.postgres_url)
        .await?;
    info!(max_connections = config.max_connections, "database pool ready");
    Ok(pool)
}

/// Run [`INIT_SCRIPT`] as a single multi-statement batch.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(INIT_SCRIPT).await?;
    info!("initialization script applied");
    Ok(())
}
