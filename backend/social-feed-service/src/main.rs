use actix_web::{App, HttpServer};
use anyhow::{Context, Result};
use s3_utils::S3Client;
use social_feed_service::config::{Config, StoreBackend};
use social_feed_service::handlers::{self, AppState};
use social_feed_service::repository::{PgStore, Stores};
use social_feed_service::services::{DisabledMediaStore, MediaStore, S3MediaStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn build_stores(config: &Config) -> Result<Stores> {
    match config.store {
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on restart");
            Ok(Stores::memory())
        }
        StoreBackend::Postgres => {
            let database = config
                .database
                .as_ref()
                .context("DATABASE_URL is required for the postgres store")?;

            let pg_pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .min_connections(database.min_connections)
                .acquire_timeout(Duration::from_secs(10))
                .idle_timeout(Duration::from_secs(600))
                .connect(&database.url)
                .await
                .context("Failed to connect to database")?;

            PgStore::new(pg_pool.clone())
                .health_check()
                .await
                .context("Failed to verify database connection")?;
            info!("✅ Database pool created and verified");

            if database.run_migrations {
                sqlx::migrate!("./migrations")
                    .run(&pg_pool)
                    .await
                    .context("Failed to run database migrations")?;
                info!("✅ Database migrations completed");
            }

            Ok(Stores::postgres(pg_pool))
        }
    }
}

async fn build_media(config: &Config) -> Arc<dyn MediaStore> {
    match &config.media {
        Some(s3_config) => {
            let client = S3Client::with_config(s3_config.clone()).await;
            if let Err(err) = client.health_check().await {
                tracing::warn!(error = ?err, "S3 bucket not reachable at startup");
            }
            info!(bucket = %s3_config.bucket, "✅ Media storage enabled");
            Arc::new(S3MediaStore::new(client.operations()))
        }
        None => {
            info!("S3_BUCKET not set; image upload disabled");
            Arc::new(DisabledMediaStore)
        }
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("🔧 Starting social-feed-service v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "✅ Configuration loaded: env={}, port={}, store={:?}",
        config.app.env, config.app.port, config.store
    );

    let stores = build_stores(&config).await?;
    let media = build_media(&config).await;
    let state = AppState::new(&stores, media, config.feed.clone(), &config.auth.jwt_secret);

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    info!("Starting HTTP server at {}", bind_address);

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(TracingLogger::default())
            .configure(move |cfg| handlers::configure(cfg, &state))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("HTTP server terminated with an error")?;

    Ok(())
}
