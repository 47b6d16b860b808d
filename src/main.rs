use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod codec;
mod config;
mod errors;
mod handlers;
mod kv;
mod models;
mod routes;
mod services;

use kv::{KvStore, RedisKv};
use routes::routes::AppState;
use services::file_store::FileStore;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting file-drop with config: {:?}", cfg);

    // --- Connect to Redis ---
    let client = redis::Client::open(cfg.redis_url.as_str())
        .with_context(|| format!("opening Redis client for {}", cfg.redis_url))?;
    let conn = redis::aio::ConnectionManager::new(client)
        .await
        .context("connecting to Redis")?;
    let kv: Arc<dyn KvStore> = Arc::new(RedisKv::new(conn));

    // Fail fast on bad credentials rather than at the first upload.
    kv.ping().await.context("pinging Redis")?;
    tracing::info!("Redis connection established");

    // --- Initialize core service ---
    let store = FileStore::new(kv, cfg.store_settings());

    // --- Build router ---
    let state = AppState {
        store,
        public_url: cfg.public_url.clone(),
    };
    let app: Router = routes::routes::routes().with_state(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
