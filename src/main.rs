use doc_chat::api::{create_router, AppState};
use doc_chat::infrastructure::{config::DEFAULT_CONFIG_PATH, logging, AppConfig};
use std::net::SocketAddr;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let (config, source) = AppConfig::load()?;
    logging::init(config.pipeline.log_path())?;
    match &source {
        Some(path) => info!(
            path = %path.display(),
            log_path = %config.pipeline.log_path().display(),
            "configuration loaded"
        ),
        None => warn!(path = DEFAULT_CONFIG_PATH, "config file not found, using defaults"),
    }

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let state = AppState::from_config(config).await.inspect_err(|e| {
        tracing::error!(error = %e, "failed to initialize providers");
    })?;
    let app = create_router(state);

    info!("doc-chat listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
