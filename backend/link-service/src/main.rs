use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use crypto_core::{PasswordHasher, TokenService};
use link_service::config::{Config, LogFormat, StoreBackend};
use link_service::db::{MemoryStore, PgStore, Store};
use link_service::handlers;
use link_service::middleware::BearerAuth;
use link_service::schema::build_schema;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,link_service=debug".into());

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_target(true),
            )
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
    }
}

async fn open_store(config: &Config) -> Result<Arc<dyn Store>> {
    match config.store.backend {
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let db_config = config
                .store
                .database
                .as_ref()
                .context("postgres backend selected without a database configuration")?;
            db_config.log_config();

            let pool = db_pool::create_pool(db_config)
                .await
                .context("Failed to create database pool")?;
            let store = PgStore::new(pool);

            if config.store.run_migrations {
                store.migrate().await.context("Failed to run migrations")?;
            }

            Ok(Arc::new(store))
        }
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.logging.format);

    info!("Starting link service...");

    let tokens = Arc::new(
        TokenService::new(&config.auth.app_secret, config.auth.token_expiry_seconds)
            .context("Failed to initialize token service")?,
    );
    let passwords = Arc::new(
        PasswordHasher::new(config.auth.password_hash)
            .context("Failed to initialize password hasher")?,
    );
    info!(
        token_expiry_seconds = ?config.auth.token_expiry_seconds,
        ownership_check = config.graphql.enforce_link_ownership,
        "Authentication configured"
    );

    let store = open_store(&config).await?;
    let schema = build_schema(Arc::clone(&tokens), passwords, &config.graphql);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Link service listening on http://{}", bind_addr);

    let graphql = config.graphql.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(BearerAuth::new(Arc::clone(&tokens)))
            .app_data(web::Data::new(schema.clone()))
            .app_data(web::Data::from(Arc::clone(&store)))
            .configure(|cfg| handlers::configure(cfg, &graphql))
    })
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {bind_addr}"))?
    .run()
    .await?;

    Ok(())
}
