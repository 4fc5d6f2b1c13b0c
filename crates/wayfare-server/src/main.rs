//! Wayfare HTTP API Server
//!
//! Serves the storefront API (catalog, reservations, inquiries), the admin
//! back office API and the media library on top of `wayfare-backend`.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    response::Json,
    routing::get,
};
use serde_json::{Value, json};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use wayfare_backend::{
    Backend, S3Storage, SqliteStore,
    mail::HttpMailer,
    media::MAX_UPLOAD_BYTES,
};

mod auth;
mod config;
mod error;
mod models;
mod routes;
mod worker;


use config::ServerConfig;
use error::{ApiError, Result};
use worker::{AdminEvent, WriteJob};

/// Main application state
#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
    pub config: ServerConfig,
    pub job_sender: mpsc::UnboundedSender<WriteJob>,
    pub events: broadcast::Sender<AdminEvent>,
}

impl AppState {
    /// Wire a backend into state and start the write worker
    pub fn new(backend: Backend, config: ServerConfig) -> Self {
        let (job_sender, job_receiver) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(64);

        let state = Self {
            backend,
            config,
            job_sender,
            events,
        };
        worker::spawn_write_worker(state.clone(), job_receiver);
        state
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "wayfare_server=debug,tower_http=debug".to_string()),
        )
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;
    info!("Starting Wayfare Server on {}:{}", config.host, config.port);

    if let Some(dir) = config
        .database_url
        .strip_prefix("sqlite:")
        .and_then(|path| std::path::Path::new(path.trim_start_matches("//")).parent())
        .filter(|dir| !dir.as_os_str().is_empty())
    {
        std::fs::create_dir_all(dir)?;
    }
    let store = SqliteStore::new(&config.database_url)
        .await
        .map_err(|e| ApiError::Config(format!("Failed to open document store: {}", e)))?;

    if config.auth.secret_generated {
        warn!("AUTH_JWT_SECRET is not set, sessions will not survive a restart");
    }
    if !config.mail.enabled() {
        warn!("MAIL_API_KEY is not set, inquiry emails will be reported as warnings");
    }

    let mut builder = Backend::builder(Arc::new(store), config.auth.jwt_secret.as_bytes())
        .token_ttl(time::Duration::seconds(config.auth.token_ttl_seconds))
        .mailer(Arc::new(HttpMailer::new(config.mail.clone())))
        .admin_recipient(config.mail.admin_recipient.clone());

    match &config.media {
        Some(media) => match S3Storage::connect(&media.s3) {
            Ok(storage) => {
                // Ensure S3 bucket exists
                if let Err(e) = storage.ensure_bucket().await {
                    error!("Failed to ensure media bucket exists: {}", e);
                }
                builder = builder.media(Arc::new(storage), media.public_base_url.clone());
                info!("Media library enabled");
            }
            Err(e) => error!("Media library disabled, failed to connect: {}", e),
        },
        None => info!("Media credentials not set, media library disabled"),
    }

    let backend = builder.build();

    if let (Some(email), Some(password)) = (
        config.auth.bootstrap_email.as_deref(),
        config.auth.bootstrap_password.as_deref(),
    ) {
        if let Err(e) = backend.admins.bootstrap_superadmin(email, password).await {
            error!("Failed to bootstrap superadmin {}: {}", email, e);
        }
    }

    // Create application state and start the background write worker
    let state = AppState::new(backend, config.clone());

    // Build router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| ApiError::Config("Invalid HOST value".to_string()))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // API routes
        .nest("/api", api_routes())
        // Back office pages
        .merge(routes::pages::router())
        // Middleware
        .layer(middleware::from_fn(auth::route_guard))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                // base64 inflates uploads by a third
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES * 2)),
        )
        .with_state(state)
}

/// API routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(routes::storefront::router())
        .merge(routes::booking::router())
        .merge(routes::auth::router())
        .nest("/media", routes::media::router())
        .nest("/admin", routes::admin::router())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Health check endpoint
async fn health_check() -> Result<Json<Value>> {
    Ok(Json(json!({
        "status": "healthy",
        "service": "wayfare-server",
        "version": env!("CARGO_PKG_VERSION"),
        "core_version": wayfare::version(),
        "timestamp": time::OffsetDateTime::now_utc()
    })))
}
