mod api;
mod auth;
mod config;
mod database;
mod models;
mod repositories;
mod services;

use anyhow::Result;
use auth::{extractors::AppState, jwt::JwtService};
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use config::AppConfig;
use database::Database;
use services::storage::StorageService;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studyvault_rs=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let startup_time = Instant::now();

    // Load configuration
    let config = AppConfig::new()?;
    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    info!("Starting StudyVault server on {}", bind_address);

    // Initialize database
    let database = match Database::new(&config.database.url, config.database.max_connections).await
    {
        Ok(db) => {
            info!("Database connected successfully");
            db
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e);
        }
    };

    // Initialize object storage
    let storage = match StorageService::new(&config.storage.data_dir) {
        Ok(service) => {
            info!("Object storage initialized at {}", config.storage.data_dir);
            Arc::new(service)
        }
        Err(e) => {
            error!("Failed to initialize object storage: {}", e);
            return Err(e);
        }
    };

    // Initialize JWT service
    let jwt_service = match JwtService::new(&config.auth) {
        Ok(service) => {
            info!("JWT service initialized successfully");
            service
        }
        Err(e) => {
            error!("Failed to initialize JWT service: {}", e);
            return Err(e);
        }
    };

    let max_upload_bytes = config.storage.max_upload_bytes;

    // Create application state
    let app_state = AppState {
        database,
        storage,
        jwt_service,
        config: config.clone(),
        startup_time,
    };

    // Build application router
    let app = create_app(app_state, max_upload_bytes).await?;

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn create_app(app_state: AppState, max_upload_bytes: usize) -> Result<Router> {
    let app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get({
            let db = app_state.database.clone();
            move || health_handler(db)
        }))
        .nest("/api", api::create_router().await?)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Ok(app)
}

async fn root_handler() -> &'static str {
    "StudyVault: Study Resource Library"
}

async fn health_handler(database: Database) -> &'static str {
    match database.health_check().await {
        Ok(_) => "OK",
        Err(_) => "Database connection failed",
    }
}
