use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use user_service::{
    config::Config,
    db::{create_pool, run_migrations, PgUserStore, UserStore},
    events::EventPipeline,
    handlers, metrics,
    services::UserService,
    telemetry, AppState,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting user-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    metrics::init_metrics();

    let db_pool = create_pool(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to create database pool")?;

    tracing::info!(
        "Database pool created with {} max connections",
        config.database.max_connections
    );

    if config.database.run_migrations {
        tracing::info!("Running database migrations...");
        run_migrations(&db_pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("Database migrations completed");
    } else {
        tracing::info!("Skipping database migrations (RUN_MIGRATIONS=false)");
    }

    let pipeline = EventPipeline::start(&config.kafka).await?;

    let store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(db_pool));
    let state = web::Data::new(AppState::new(UserService::new(store, pipeline.producer())));

    let (host, port) = config.bind_address();
    tracing::info!("Listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("Failed to bind {}:{}", host, port))?
    .run()
    .await
    .context("HTTP server error")?;

    tracing::info!("HTTP server stopped; shutting down user events consumer");
    pipeline.shutdown().await;

    Ok(())
}
