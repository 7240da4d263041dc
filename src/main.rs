//! Biblio Server - library lending REST API

use anyhow::Context;
use axum::{
    http::HeaderValue,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use biblio_server::{
    api,
    config::{AppConfig, ServerConfig},
    repository::Repository,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("biblio_server={},tower_http=debug", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Biblio Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
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

    let repository = Repository::new(pool.clone());
    let services = Services::new(repository, &config.auth);

    if !services.sessions.codec().is_configured() {
        tracing::warn!(
            "SECRET_KEY or ALGORITHM missing or unusable: every login and protected route will fail with a configuration error"
        );
    }

    let addr = SocketAddr::new(
        config.server.host.parse::<std::net::IpAddr>().context("Invalid host address")?,
        config.server.port,
    );
    let cors = cors_layer(&config.server)?;

    let state = AppState {
        services: Arc::new(services),
        pool,
    };

    let app = create_router(state, cors);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// CORS from the configured allow-list; an empty list allows any origin
fn cors_layer(server: &ServerConfig) -> anyhow::Result<CorsLayer> {
    let origin = if server.allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let origins = server
            .allowed_origins
            .iter()
            .map(|o| HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin '{}'", o)))
            .collect::<anyhow::Result<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Create the application router with all routes
fn create_router(state: AppState, cors: CorsLayer) -> Router {
    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/login", post(api::auth::login))
        .route("/auth/register", post(api::auth::register))
        .route("/auth/me", get(api::auth::me))
        // Users
        .route("/users", post(api::users::create_user))
        .route("/users/:id", get(api::users::get_user))
        .route("/users/:id", put(api::users::update_user))
        .route("/users/:id", delete(api::users::delete_user))
        // Materials
        .route("/materials", post(api::materials::create_material))
        .route("/materials/:id", get(api::materials::get_material))
        .route("/materials/:id", put(api::materials::update_material))
        .route("/materials/:id", delete(api::materials::delete_material))
        // Loans
        .route("/loans", get(api::loans::list_loans))
        .route("/loans", post(api::loans::create_loan))
        .route("/loans/:id", get(api::loans::get_loan))
        .route("/loans/:id/return", put(api::loans::return_loan))
        .route("/loans/user/:user_id", get(api::loans::get_user_loans))
        // Reference data
        .route("/roles/:id", delete(api::references::delete_role))
        .route("/authors/:id", delete(api::references::delete_author))
        .route("/material-types/:id", delete(api::references::delete_material_type))
        .route("/loan-status/:id", delete(api::references::delete_loan_status))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
