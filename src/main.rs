//! Libris Server - library circulation

use anyhow::Context;
use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use libris_server::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::Repository,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.logging);

    tracing::info!("Starting Libris Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    tracing::info!(
        loan_period_months = config.circulation.loan_period_months,
        fine_per_day = %config.circulation.fine_per_day,
        "Circulation policy loaded"
    );

    let repository = Repository::new(pool);
    let services = Services::new(repository, config.auth.clone(), &config.circulation);

    services
        .auth
        .ensure_bootstrap_admin()
        .await
        .context("Failed to create bootstrap admin")?;

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("libris_server={},tower_http=debug", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/login", post(api::auth::login))
        // Circulation
        .route("/borrow", post(api::circulation::borrow))
        .route("/return", post(api::circulation::return_copy))
        // Fines and payments
        .route("/payments", get(api::fines::list_unpaid_fines))
        .route("/payments", post(api::fines::pay_fine))
        .route("/fines/assess", post(api::fines::assess_overdue_fines))
        // Books and copies
        .route("/books", post(api::copies::add_book))
        .route("/books/search", get(api::copies::search_books))
        .route("/copies", post(api::copies::add_copies))
        .route("/copies/:id/status", get(api::copies::copy_status))
        .route("/copies/:id/remove", post(api::copies::remove_copy))
        // Members
        .route("/members", post(api::members::add_member))
        .route("/members/:id", get(api::members::get_member))
        // Librarian accounts
        .route("/librarians", get(api::librarians::list_librarians).post(api::librarians::create_librarian))
        .route(
            "/librarians/:id",
            put(api::librarians::update_librarian).delete(api::librarians::delete_librarian),
        )
        // Statistics
        .route("/stats", get(api::stats::get_stats))
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new()),
        )
}
