use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use portfolio_chat::config::Config;
use portfolio_chat::routes;
use portfolio_chat::services::gemini::GeminiModel;
use portfolio_chat::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let provider = Arc::new(GeminiModel::new(&config));
    let state = Arc::new(AppState::new(provider, config.reply_timeout));

    let app = routes::create_router(&config.static_dir)
        .with_state(state)
        .layer(CorsLayer::very_permissive());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, model = %config.model, "portfolio chat listening");
    axum::serve(listener, app).await?;

    Ok(())
}
