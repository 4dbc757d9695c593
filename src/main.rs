use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod service;
mod store;
mod utils;

use config::Config;
use db::{ensure_schema, init_db};
use routes::Limits;
use service::{AppState, seed::seed_demo_users};
use store::{Store, memory::MemoryStore, mysql::MySqlStore};

use crate::docs::ApiDoc;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const EMAIL_WARMUP_BATCH: usize = 500;

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    let Some(url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set, keeping all data in memory");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let pool = init_db(url).await.context("connecting to MySQL")?;
    ensure_schema(&pool).await.context("creating schema")?;

    let store = Arc::new(MySqlStore::new(pool.clone()));

    let warm = store.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = warm.emails().warmup(&pool, EMAIL_WARMUP_BATCH).await {
            error!(error = %e, "Failed to warm up email index");
        }
    });

    Ok(store as Arc<dyn Store>)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store = open_store(&config).await?;

    if config.seed_demo_users && seed_demo_users(store.as_ref()).await? {
        info!("Demo accounts available: admin@, manager@ and user@taskflow.com");
    }

    let state = Data::new(AppState::new(store));
    let limits = Limits::from_config(&config)?;
    let server_addr = config.server_addr.clone();

    info!(addr = %server_addr, prefix = %config.api_prefix, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard so JS/CSS assets resolve
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .app_data(Data::new(config.clone()))
            .app_data(routes::json_config())
            .configure(|cfg| routes::configure(cfg, &config, &limits))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
