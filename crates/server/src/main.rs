//! Folio server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use folio_api::{AppState, router};
use folio_common::{
    AppError, Config, LocalStorage, PageCache, RedisPageCache,
    config::{CacheBackend, CacheConfig},
};
use fred::prelude::*;
use tokio::signal;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest request body accepted, image uploads included.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
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
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Build the page cache selected in configuration.
async fn page_cache(config: &CacheConfig) -> Result<PageCache, Box<dyn std::error::Error>> {
    let ttl = Duration::from_secs(config.ttl_secs);

    match config.backend {
        CacheBackend::Memory => {
            info!(ttl_secs = config.ttl_secs, "Using in-process page cache");
            Ok(PageCache::in_memory(ttl))
        }
        CacheBackend::Redis => {
            let url = config.redis_url.as_deref().ok_or_else(|| {
                AppError::Config("cache.redis_url is required for the redis backend".to_string())
            })?;

            let fred_config = fred::types::config::Config::from_url(url)?;
            let client = fred::clients::Client::new(fred_config, None, None, None);
            client.connect();
            client.wait_for_connect().await?;
            info!(ttl_secs = config.ttl_secs, "Connected to Redis page cache");

            let store = RedisPageCache::new(Arc::new(client), config.prefix.clone());
            Ok(PageCache::new(Arc::new(store), ttl))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting folio server...");

    // Load configuration, from an explicit file when FOLIO_CONFIG is set
    let config = match std::env::var("FOLIO_CONFIG") {
        Ok(path) => Config::from_file(path)?,
        Err(_) => Config::load()?,
    };

    // Connect to database
    let db = folio_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    folio_db::migrate(&db).await?;
    info!("Migrations completed");

    let page_cache = page_cache(&config.cache).await?;
    let storage = Arc::new(LocalStorage::new(
        config.storage.base_path.clone(),
        config.storage.base_url.clone(),
    ));

    let state = AppState::new(
        Arc::new(db),
        storage,
        page_cache,
        config.auth.clone(),
        config.pagination.page_size,
    );

    let app = router(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http());

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
