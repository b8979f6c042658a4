use anyhow::Result;
use orchestrator::{ContainerRuntime, Docker};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use agent::config::{ConfigManager, DEFAULT_CONFIG_DIR};
use agent::{build_router, spawn_event_logger, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("agent=info".parse()?)
        .add_directive("orchestrator=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("hyper=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    let config_dir =
        std::env::var("AGENT_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let config_manager = ConfigManager::new(config_dir).await?;
    let config = config_manager.get_current_config();

    let api_key = std::env::var("AGENT_API_KEY")
        .unwrap_or_else(|_| "default-development-key".to_string());

    if api_key == "default-development-key" {
        warn!("Using default development API key - set AGENT_API_KEY environment variable for production");
    }

    let runtime: Arc<dyn ContainerRuntime> = Arc::new(Docker::with_binary(&config.runtime_binary));
    let nodes = config.build_nodes(runtime)?;
    for node in nodes.values() {
        spawn_event_logger(node.clone()).await;
    }
    info!("Managing {} nodes", nodes.len());

    let state = Arc::new(AppState::new(api_key, nodes));

    if config.auto_start {
        let state = state.clone();
        tokio::spawn(async move { state.start_all().await });
    }

    let app = build_router(state.clone());

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Node agent listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down, stopping nodes");
    state.stop_all().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
