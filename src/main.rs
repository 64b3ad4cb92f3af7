use linkhub::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Startup order matters: configuration first (it can abort the process),
/// then logging, then the database, and only then the listener.
#[tokio::main]
async fn main() {
    // .env is a local convenience; in production the variables are real.
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // RUST_LOG wins; otherwise default to chatty app logs and quieter deps.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "linkhub=debug,tower_http=info,axum=trace".into());

    // Pretty output for a human at a terminal, JSON for log aggregators.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    // The schema must be current before the first request is accepted.
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("FATAL: Failed to run database migrations.");

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    let port = config.port;
    let app_state = AppState { repo, config };
    let app = create_router(app_state);

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("FATAL: Failed to bind HTTP listener.");

    tracing::info!("Listening on 0.0.0.0:{port}");
    tracing::info!("Swagger UI available at: http://localhost:{port}/swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
