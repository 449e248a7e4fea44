use anyhow::Context as _;
use sea_orm::Database;
use tracing::info;

use moodzic_api::config::ApiConfig;
use moodzic_api::dispatch::Cors;
use moodzic_api::infra::seed::{ensure_admin, seed_reference_data};
use moodzic_api::logger::RequestLogger;
use moodzic_api::router::build_router;
use moodzic_api::routes::api_routes;
use moodzic_api::state::AppState;
use moodzic_api_migration::{Migrator, MigratorTrait as _};
use moodzic_core::config::Config as _;
use moodzic_core::tracing::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ApiConfig::from_env().context("load configuration")?;

    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;
    Migrator::up(&db, None).await.context("run migrations")?;

    let routes = api_routes().context("build route table")?;
    seed_reference_data(&db, &routes).await?;
    if let Some((email, password)) = config.bootstrap_admin() {
        ensure_admin(&db, email, password)
            .await
            .context("create bootstrap admin")?;
    }

    let state = AppState {
        db: db.clone(),
        jwt_secret: config.jwt_secret,
        http: reqwest::Client::new(),
        audio_service_url: config.audio_service_url,
    };
    let logger = RequestLogger::new(db);
    let cors = Cors::new(&config.cors_allowed_origin).context("invalid CORS_ALLOWED_ORIGIN")?;
    let router = build_router(state, routes, logger.clone(), cors);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!("moodzic api listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    logger.drain().await;
    info!("request log drained, exiting");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
