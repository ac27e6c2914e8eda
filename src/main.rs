//! streamlens server entry point.
//!
//! Starts the per-channel monitors for every active channel and serves the
//! REST command/read surface.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use streamlens::api;
use streamlens::app_state::AppState;
use streamlens::config::MonitorConfig;
use streamlens::domain::LiveRegistry;
use streamlens::persistence::MonitorStore;
use streamlens::proxy::SolverClient;
use streamlens::service::Supervisor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration; PROXY_URL is mandatory
    let config = Arc::new(MonitorConfig::from_env()?);
    tracing::info!(addr = %config.listen_addr, "starting streamlens");

    // Connect persistence; the database may still be starting alongside us
    let pool = connect_with_retry(&config).await?;
    let store = Arc::new(MonitorStore::new(pool));

    // Build the monitoring layer
    let registry = Arc::new(LiveRegistry::new());
    let solver = Arc::new(SolverClient::new(&config));
    let supervisor = Arc::new(Supervisor::new(
        Arc::clone(&store),
        registry,
        solver,
        Arc::clone(&config),
    ));

    // Launch monitors for every active channel
    let started = supervisor.start_active_channels().await?;
    tracing::info!(channels = started, "channel monitors started");

    // Build application state and router
    let app_state = AppState {
        supervisor,
        store,
        config: Arc::clone(&config),
    };
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

const DB_CONNECT_ATTEMPTS: u32 = 5;
const DB_CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Establishes the PostgreSQL pool, retrying a bounded number of times with
/// a fixed delay between attempts. Fatal only after exhausting the retries.
async fn connect_with_retry(config: &MonitorConfig) -> Result<PgPool, sqlx::Error> {
    let mut attempt = 1;
    loop {
        match PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(err) if attempt < DB_CONNECT_ATTEMPTS => {
                tracing::warn!(
                    attempt,
                    %err,
                    "failed to connect to database; retrying in 5 s"
                );
                tokio::time::sleep(DB_CONNECT_RETRY_DELAY).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
