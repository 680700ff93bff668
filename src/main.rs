// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use innovaid_backend::config::Config;
use innovaid_backend::events::EventBus;
use innovaid_backend::routes;
use innovaid_backend::services::LostFoundService;
use innovaid_backend::state::AppState;
use innovaid_backend::store::{ItemStore, MemoryItemStore, PgItemStore};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const MAX_DB_RETRIES: u32 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment (.env is read if present)
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let store: Arc<dyn ItemStore> = match &config.database_url {
        Some(url) => {
            let pool = connect_with_retry(url, config.db_max_connections).await?;

            tracing::info!("Running migrations...");
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Migrations applied successfully.");

            Arc::new(PgItemStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, items are kept in memory only");
            Arc::new(MemoryItemStore::new())
        }
    };

    let events = EventBus::default();
    spawn_event_logger(&events);

    let service = LostFoundService::new(store, events)
        .with_timeout(config.request_timeout)
        .with_soft_delete(config.soft_delete);

    let state = AppState {
        service,
        config: config.clone(),
    };

    let app = routes::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Exponential backoff starting at 1s, doubling per attempt.
async fn connect_with_retry(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let mut attempt = 0;
    let mut delay = Duration::from_secs(1);
    loop {
        match PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(url)
            .await
        {
            Ok(pool) => {
                tracing::info!("Database connected...");
                return Ok(pool);
            }
            Err(e) if attempt < MAX_DB_RETRIES => {
                attempt += 1;
                tracing::warn!(
                    "Database not ready, retrying in {:?}... (Attempt {}): {}",
                    delay,
                    attempt,
                    e
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => {
                tracing::error!("Failed to connect to database after {} retries", MAX_DB_RETRIES);
                return Err(e);
            }
        }
    }
}

/// Stand-in for the real-time push collaborator: logs every outbound event.
fn spawn_event_logger(events: &EventBus) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let payload = serde_json::to_string(&event).unwrap_or_default();
                    tracing::info!(event = event.name(), item_id = %event.item_id(), %payload, "Item event");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event logger lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
