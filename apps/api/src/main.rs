mod config;
mod decode;
mod errors;
mod layout;
mod llm_client;
mod models;
mod render;
mod review;
mod routes;
mod schema;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::layout::PageGeometry;
use crate::llm_client::{LlmCapability, OpenAiClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting revi API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client (optional; analyses are refused without it)
    let llm: Option<Arc<dyn LlmCapability>> = match &config.openai_api_key {
        Some(key) => {
            let client = OpenAiClient::new(key.clone())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(client))
        }
        None => {
            warn!("OPENAI_API_KEY is not set; review requests will fail with CONFIGURATION_ERROR");
            None
        }
    };

    let state = AppState {
        llm,
        page: PageGeometry::A4,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins once the web client's domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
