//! KitchenBuddy API Gateway
//!
//! The HTTP surface for the kitchen assistant.
//! Handles:
//! - Inventory CRUD
//! - Recipe ingestion (text, photo or structured JSON) and export
//! - Recipe suggestions
//! - Observability (logging, metrics, request ids)

mod handlers;
mod middleware;
mod state;

pub use state::AppState;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use kitchenbuddy_common::{
    config::AppConfig,
    db::DbPool,
    extraction,
    metrics::{self, EXTRACTION_BUCKETS},
    KitchenStore, MemoryStore, Repository,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Room for multipart boundaries, headers and the text field on top of the file cap
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    let config = Arc::new(config);

    init_tracing(&config);

    info!("Starting KitchenBuddy API Gateway v{}", kitchenbuddy_common::VERSION);

    // Initialize metrics
    let prometheus = install_prometheus()?;
    metrics::register_metrics();

    // Initialize the store
    let store: Arc<dyn KitchenStore> = if config.uses_memory_store() {
        warn!("Using in-memory store, data will not survive a restart");
        Arc::new(MemoryStore::new())
    } else {
        let db = DbPool::new(&config.database).await?;
        db.ensure_schema().await?;
        Arc::new(Repository::new(db))
    };

    // Initialize the extraction client
    let client = extraction::create_client(&config.extraction)
        .context("Failed to create extraction client")?;
    info!(
        provider = client.provider_name(),
        model = client.model_name(),
        "Extraction client ready"
    );

    // Create app state
    let state = AppState::new(config.clone(), store, client).with_metrics(prometheus);

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logging {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

fn install_prometheus() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Suffix("duration_seconds".to_string()), EXTRACTION_BUCKETS)?
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    // Without the HTTP listener, histogram upkeep is our job
    let upkeep = handle.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        loop {
            interval.tick().await;
            upkeep.run_upkeep();
        }
    });

    Ok(handle)
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.upload.max_file_bytes + MULTIPART_OVERHEAD_BYTES;
    let request_timeout = state.config.request_timeout();

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Operational endpoints
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics))

        // Inventory endpoints
        .route(
            "/ingredients",
            post(handlers::ingredients::create_ingredient).get(handlers::ingredients::list_ingredients),
        )
        .route("/ingredients/{id}", put(handlers::ingredients::update_ingredient))

        // Recipe endpoints
        .route(
            "/recipes",
            post(handlers::recipes::create_recipe).get(handlers::recipes::list_recipes),
        )
        .route("/recipes/download", get(handlers::recipes::download_recipes))

        // Suggestion endpoints
        .route("/chat/recipe-suggestion", post(handlers::chat::recipe_suggestion))

        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(middleware::metrics::track_requests))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors)
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
