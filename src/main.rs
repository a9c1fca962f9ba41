mod config;
mod llm;
mod routes;
mod state;

use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use config::LlmConfig;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bankbot_backend=debug,tower_http=info".into()),
        )
        .init();

    // .env is optional; a real environment wins over the file.
    if dotenvy::dotenv().is_ok() {
        info!("Loaded environment from .env");
    }

    let config = LlmConfig::from_env()?;
    info!(
        "Configured model {} at {} (temperature={}, max_tokens={})",
        config.model, config.base_url, config.temperature, config.max_tokens
    );

    let app_state = AppState::new(config);

    let app = Router::new()
        .merge(routes::create_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
