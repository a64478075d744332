mod api;
mod app;
mod auth;
mod config;
mod db;
mod domain;
mod error;
mod logging;
mod middleware;
mod routes;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting HomeHero backend"
    );

    // Connect to MongoDB and ensure indexes
    let db = db::MongoDb::connect(&settings).await?;
    db.ensure_indexes().await?;

    // Signing-key cache for token verification
    let key_cache = auth::KeyCache::new(
        settings.auth_jwks_url.clone(),
        settings.auth_issuer.clone(),
        settings.auth_audience.clone(),
        settings.auth_keys_cache_ttl_seconds,
    );

    // Optionally warm the key cache
    if let Err(e) = key_cache.warm_cache().await {
        tracing::warn!(error = %e, "Failed to warm signing-key cache - will fetch on first request");
    }

    // Create application state
    let state = app::AppState::new(db, settings.clone(), key_cache);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
