use std::sync::Arc;

use mcp_quickstart_server::{
    build_app, config::Config, domain::build_registry, logging, registry::Category, AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    logging::init_logging();

    let config = Config::from_env()?;
    let registry = build_registry(config.profile)?;

    info!(
        profile = %config.profile,
        tools = registry.handlers(Category::Tool).count(),
        resources = registry.handlers(Category::Resource).count(),
        prompts = registry.handlers(Category::Prompt).count(),
        "handlers registered"
    );

    let bind_socket = config.bind_socket()?;
    let state = AppState::new(Arc::new(registry));
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
