//! Foodgram HTTP API
//!
//! The entry point for all external API requests.
//! Handles:
//! - Token resolution and permission checks
//! - Request routing
//! - Observability (logging, metrics)

mod handlers;
mod middleware;
mod pagination;
mod schemas;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use foodgram_common::{config::AppConfig, db::DbPool, media::MediaStore, metrics};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub media: MediaStore,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    // Initialize tracing
    init_tracing(&config);

    info!("Starting Foodgram API v{}", foodgram_common::VERSION);

    // Initialize metrics
    metrics::register_metrics();
    if let Some(port) = config.observability.metrics_port {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], port))
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .install()?;
        info!("Prometheus exporter listening on port {}", port);
    }

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    let media = MediaStore::new(&config.media.root, &config.media.url_prefix);

    // Create app state
    let state = AppState {
        config: config.clone(),
        db,
        media,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = TimeoutLayer::new(state.config.request_timeout());

    // API routes
    let api_routes = Router::new()
        // User endpoints
        .route(
            "/users/",
            get(handlers::users::list_users).post(handlers::users::register),
        )
        .route("/users/me/", get(handlers::users::me))
        .route(
            "/users/me/avatar/",
            put(handlers::users::put_avatar).delete(handlers::users::delete_avatar),
        )
        .route("/users/set_password/", post(handlers::users::set_password))
        .route("/users/subscriptions/", get(handlers::users::subscriptions))
        .route("/users/{id}/", get(handlers::users::get_user))
        .route(
            "/users/{id}/subscribe/",
            post(handlers::users::subscribe).delete(handlers::users::unsubscribe),
        )
        // Token endpoints
        .route("/auth/token/login/", post(handlers::auth::login))
        .route("/auth/token/logout/", post(handlers::auth::logout))
        // Ingredient endpoints
        .route("/ingredients/", get(handlers::ingredients::list_ingredients))
        .route("/ingredients/{id}/", get(handlers::ingredients::get_ingredient))
        // Recipe endpoints
        .route(
            "/recipes/",
            get(handlers::recipes::list_recipes).post(handlers::recipes::create_recipe),
        )
        .route(
            "/recipes/download_shopping_cart/",
            get(handlers::recipes::download_shopping_cart),
        )
        .route(
            "/recipes/{id}/",
            get(handlers::recipes::get_recipe)
                .patch(handlers::recipes::update_recipe)
                .delete(handlers::recipes::delete_recipe),
        )
        .route(
            "/recipes/{id}/favorite/",
            post(handlers::recipes::add_favorite).delete(handlers::recipes::remove_favorite),
        )
        .route(
            "/recipes/{id}/shopping_cart/",
            post(handlers::recipes::add_to_cart).delete(handlers::recipes::remove_from_cart),
        )
        .route("/recipes/{id}/get-link/", get(handlers::recipes::get_short_link));

    // Compose the app
    Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Short-link resolver
        .route("/s/{id}/", get(handlers::shortlink::resolve))
        .nest("/api", api_routes)
        .layer(from_fn_with_state(state.clone(), middleware::auth::resolve_token))
        .layer(TraceLayer::new_for_http())
        .layer(timeout)
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
