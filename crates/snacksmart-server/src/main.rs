#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod api;
mod config;
mod middleware;

use config::ServerConfig;
use snacksmart_ai::{LlmRetryConfig, XaiClient};
use snacksmart_core::{AppCore, paths};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,snacksmart_server=debug".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting SnackSmart server");

    let config = ServerConfig::load().expect("Failed to load server configuration");

    let db_path = match &config.db_path {
        Some(path) => path.clone(),
        None => paths::ensure_database_path_string()
            .expect("Failed to determine SnackSmart database path"),
    };

    let mut core_settings = config.core.clone();
    if core_settings.knowledge_dir.is_none() {
        core_settings.knowledge_dir = paths::knowledge_dir().ok();
    }

    let llm = XaiClient::new(config.llm.api_key.clone())
        .with_base_url(config.llm.base_url.clone())
        .with_model(config.llm.model.clone())
        .with_temperature(config.llm.temperature)
        .with_search(config.llm.live_search)
        .with_retry_config(LlmRetryConfig::default());

    let core = Arc::new(
        AppCore::new(&db_path, core_settings, Arc::new(llm))
            .await
            .expect("Failed to initialize app core"),
    );

    let app = api::router(core);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind server address");
    tracing::info!(address = %addr, db_path = %db_path, "SnackSmart server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
