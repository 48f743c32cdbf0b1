use anyhow::{self, Error as AnyhowError};
use assistant::{AssistantConfig, ProviderChain};
use db::DBService;
use server::{AppState, routes};
use sqlx::Error as SqlxError;
use strip_ansi_escapes::strip;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, prelude::*};
use utils::assets::ensure_asset_dir;

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error)]
pub enum TodoEvolveError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sqlx(#[from] SqlxError),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

#[tokio::main]
async fn main() -> Result<(), TodoEvolveError> {
    // Load environment variables from `.env` so local development picks up API keys
    dotenv::dotenv().ok();

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,server={level},assistant={level},db={level},utils={level},tower_http={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string).map_err(anyhow::Error::from)?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    ensure_asset_dir()?;
    let db = DBService::new().await?;

    let config = AssistantConfig::from_env();
    let chain = ProviderChain::from_env(config.provider_timeout());
    if !chain.has_configured_provider() {
        tracing::warn!(
            "No completion provider configured (set OPEN_ROUTER_KEY or GEMINI_API_KEY); chat replies will apologize"
        );
    }

    let app_router = routes::router(AppState::new(db, chain, config));

    let port = std::env::var("BACKEND_PORT")
        .or_else(|_| std::env::var("PORT"))
        .ok()
        .and_then(|s| {
            // remove any ANSI codes before parsing
            let cleaned = String::from_utf8(strip(s.as_bytes())).ok()?;
            cleaned.trim().parse::<u16>().ok()
        })
        .unwrap_or(DEFAULT_PORT);

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    let actual_port = listener.local_addr()?.port();

    tracing::info!("Server running on http://{host}:{actual_port}");

    axum::serve(listener, app_router).await?;
    Ok(())
}
