use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{error, info};

use crate::config::AppConfig;

/// Connects the pool and applies pending migrations. Either failure is
/// fatal to startup.
pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let db = match PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, cause = classify(&e), "database connection failed");
            return Err(e).context("connect to database");
        }
    };
    info!("database connected");

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run database migrations")?;

    Ok(db)
}

fn classify(err: &sqlx::Error) -> &'static str {
    let text = err.to_string().to_lowercase();
    if text.contains("password authentication failed") || text.contains("authentication") {
        "authentication failed; check the username and password"
    } else if text.contains("connection refused") {
        "connection refused; is the database running?"
    } else if matches!(err, sqlx::Error::PoolTimedOut) || text.contains("timed out") {
        "connection timeout; check the network"
    } else {
        "unexpected database error"
    }
}
