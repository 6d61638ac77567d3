//! Binary entry point: load configuration, open the database, wire the
//! adapters and services into `AppState`, and serve the HTTP API until
//! a shutdown signal arrives.

use std::net::SocketAddr;
use std::sync::Arc;

use eva::adapters::{HttpLlmClient, HttpSttClient, HttpTtsClient, LocalObjectStore};
use eva::api::{build_router, AppState};
use eva::config::{self, Config};
use eva::db;
use eva::storage::Store;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| config::default_log_filter().into()))
        .init();

    let config = Config::from_env();
    tracing::info!(name = config::APP_NAME, version = config::APP_VERSION, "starting");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::create_dir_all(&config.object_store_root)?;

    let pool = db::open_database(&config.database_path)?;
    let store = Arc::new(Store::new(pool));

    let llm = Arc::new(HttpLlmClient::new(config.llm_base_url.clone(), config.llm_model.clone(), config.llm_timeout));
    let tts = Arc::new(HttpTtsClient::new(config.tts_base_url.clone(), config.tts_voice.clone(), config.tts_timeout));
    let stt = Arc::new(HttpSttClient::new(config.stt_base_url.clone(), config.stt_language.clone(), config.stt_timeout));
    let object_store = Arc::new(LocalObjectStore::new(config.object_store_root.clone()));

    let state = AppState::new(store, llm, tts, stt, object_store);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM when running under a process
/// supervisor (systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
