use tracing_subscriber::EnvFilter;

use toolwire_server::app_state::AppState;
use toolwire_server::tools::{EchoTool, ToolHost};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = std::env::var("TOOLWIRE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("TOOLWIRE_PORT").unwrap_or_else(|_| "3002".to_string());
    let channels =
        std::env::var("TOOLWIRE_CHANNELS").unwrap_or_else(|_| "dex,bridge".to_string());

    let mut tools = ToolHost::new();
    for channel in channels.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        tools = tools.with_tool(channel, EchoTool);
    }

    let state = AppState::new(tools);
    let app = toolwire_server::router::create_router(state);

    let addr = format!("{host}:{port}");
    tracing::info!("Toolwire server listening on {addr} (channels: {channels})");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
