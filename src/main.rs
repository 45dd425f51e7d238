use answerhub::config::Config;
use answerhub::database::{create_pool, run_migrations};
use answerhub::redis::RedisClient;
use answerhub::services::background_jobs::BackgroundJobsService;
use answerhub::store::{MemoryStore, PgStore, QaStore};
use answerhub::{AppState, create_app};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "answerhub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let store: Arc<dyn QaStore> = match config.database_url.as_deref() {
        Some(database_url) => {
            let db = create_pool(database_url).await?;
            tracing::info!("Database connection pool created");

            run_migrations(&db).await?;
            tracing::info!("Database migrations completed");

            Arc::new(PgStore::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-process store; data is not durable");
            Arc::new(MemoryStore::new())
        }
    };

    let redis = match config.redis_url.as_deref() {
        Some(redis_url) => {
            let client = RedisClient::new(redis_url).await?;
            tracing::info!("Redis client created, vote rate limiting enabled");
            Some(Arc::new(client))
        }
        None => None,
    };

    // Repair job for tallies and reputation
    BackgroundJobsService::new(store.clone()).start_all_jobs(config.reconcile_interval);

    // Create application state
    let state = AppState {
        store,
        redis,
        config: Arc::new(config.clone()),
    };

    // Create application
    let app = create_app(state);

    // Create listener
    let listener = TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;
    tracing::info!("Server listening on {}:{}", config.host, config.port);

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
