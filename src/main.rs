use std::sync::Arc;

use userhub::{app, config::AppConfig, db, state::AppState, users::repo::PgUserRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "userhub=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = match AppConfig::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return Err(e);
        }
    };
    tracing::info!(env = ?config.env, "starting userhub");

    let db = db::connect(&config).await?;
    let state = AppState::from_parts(config.clone(), Arc::new(PgUserRepository::new(db.clone())));

    let result = app::serve(app::build_app(state), &config.host, config.port).await;

    tracing::info!("http server closed");
    db.close().await;
    tracing::info!("database connection closed");
    result
}
