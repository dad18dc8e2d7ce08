use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ytdlp::YtdlpExtractor;

use fetchd::api::server::{ApiServer, ApiServerConfig, AppState};
use fetchd::config::AppConfig;
use fetchd::jobs::{JobManager, JobStore};
use fetchd::workspace::ScratchWorkspace;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fetchd=info,ytdlp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env_or_default();
    let server_config = ApiServerConfig::from_env_or_default();

    // Scratch workspace: create it and purge leftovers from a previous run.
    let workspace = ScratchWorkspace::init(config.scratch_dir.clone()).await?;
    tracing::info!(dir = %workspace.dir().display(), "scratch workspace ready");

    let store = JobStore::new();
    let extractor: Arc<dyn ytdlp::Extractor> = Arc::new(YtdlpExtractor::new(config.ytdlp.clone()));
    let manager = Arc::new(JobManager::new(
        store.clone(),
        Arc::clone(&extractor),
        workspace.clone(),
        &config.jobs,
    ));

    let state = AppState::new(store, manager, extractor);
    let server = ApiServer::new(server_config, state);

    let cancel_token = server.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            cancel_token.cancel();
        }
    });

    server.run().await?;

    // Best-effort removal of the scratch directory on the way out.
    workspace.teardown().await;

    Ok(())
}
