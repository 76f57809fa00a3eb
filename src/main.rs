use atelier_loans::{
    adapters::{memory::in_memory_dependencies, postgres::postgres_dependencies},
    api::{handlers::AppState, router::create_router},
    config::{AppConfig, StorageBackend},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier_loans=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // Create service dependencies
    let service_deps = match (config.storage_backend, &config.database_url) {
        (StorageBackend::Postgres, Some(database_url)) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Database migrations applied");

            postgres_dependencies(pool, config.authorization_scope)
        }
        _ => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            in_memory_dependencies(config.authorization_scope)
        }
    };

    let service_deps = service_deps.with_session_ttl(config.session_ttl);

    tracing::info!(
        scope = ?config.authorization_scope,
        session_ttl_secs = config.session_ttl.num_seconds(),
        "Service configuration"
    );

    // Create application state
    let app_state = Arc::new(AppState { service_deps });

    // Create router
    let app = create_router(app_state);

    // Server configuration
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app).await?;
    Ok(())
}
