mod api;
mod config;
mod models;
mod services;
mod state;
mod store;

use api::{debug, media, threads};
use config::Settings;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // Use RUST_LOG to control log levels, e.g.:
    //   RUST_LOG=resolver=debug,parts=debug  (per-tier resolution and part queries)
    //   RUST_LOG=store=debug                 (swallowed store errors)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("server=info,media=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let settings = Settings::from_env();

    let flags = if settings.allow_thread_create {
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX
    } else {
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
    };
    let manager = SqliteConnectionManager::file(&settings.db_path).with_flags(flags);
    let store_pool = Pool::builder()
        .max_size(settings.pool_size)
        .build(manager)
        .expect("Failed to create message store pool");

    let state = AppState {
        store_pool,
        identity: settings.identity(),
        settings: Arc::new(settings.clone()),
    };

    let app = axum::Router::new()
        .route("/health", axum::routing::get(debug::health))
        .route("/mms/media", axum::routing::get(media::get_media))
        .route("/threads/resolve/:address", axum::routing::get(threads::resolve))
        .route("/parts/cache", axum::routing::post(media::cache_part))
        .route("/parts/:id", axum::routing::get(media::get_part))
        .route("/debug/mms", axum::routing::get(debug::debug_mms))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(settings.bind_addr.as_str())
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {}: {}", settings.bind_addr, e));

    info!(target: "server", "Server running on http://{}", settings.bind_addr);
    info!(target: "server", "Using database: {}", settings.db_path.display());
    info!(target: "server", "Caching parts in: {}", settings.cache_dir.display());

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
