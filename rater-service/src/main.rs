use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use db_pool::{create_pool, DbConfig};
use rater_service::{handlers, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting rater service");

    let config = Config::from_env().context("failed to load configuration")?;

    let db_config = DbConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let db_pool = create_pool(db_config)
        .await
        .context("failed to connect to database")?;
    tracing::info!("connected to database");

    rater_service::db::MIGRATOR
        .run(&db_pool)
        .await
        .context("failed to run migrations")?;

    let state = AppState::new(config.clone(), db_pool);
    let addr = config.bind_addr();
    tracing::info!("listening on {addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(state.config.clone()))
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(|| async { "OK" }))
            .configure(handlers::register_routes)
    })
    .bind(&addr)?
    .run()
    .await?;

    Ok(())
}
