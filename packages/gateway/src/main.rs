use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{Level, info};

use gateway::config::AppConfig;
use gateway::database::init_db;
use gateway::seed::{ensure_indexes, seed_credentials};
use gateway::state::AppState;
use gateway::upstream::GeminiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    seed_credentials(&db, &config.auth.allowed_keys).await?;
    ensure_indexes(&db).await?;

    let media = common::storage::open_media_store(&config.storage)
        .await
        .context("Failed to open media store")?;
    info!("Media store ready ({:?} backend)", config.storage.backend);

    if config.upstream.api_key.is_empty() {
        tracing::warn!("upstream.api_key is empty; generation calls will be rejected upstream");
    }
    let provider = GeminiClient::new(config.upstream.clone())?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host/server.port")?;

    let state = AppState {
        db,
        config: Arc::new(config),
        media,
        provider: Arc::new(provider),
    };
    let app = gateway::build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
