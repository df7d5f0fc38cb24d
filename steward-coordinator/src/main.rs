//! Steward Coordinator
//!
//! Runs as a sidecar inside a workflow stage pod and coordinates the stage's
//! workload containers.
//!
//! Architecture:
//! - Configuration: Load settings from the environment injected into the pod
//! - Repositories: Kubernetes API (pods) and the log server (log streams)
//! - Services: State waiting, log relaying, result publishing, file extraction
//! - Workflow: Sequencing of one stage from start to result publication

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use steward_client::LogServerClient;
use steward_coordinator::config::Config;
use steward_coordinator::repository::{
    HttpLogRepository, KubePodRepository, LogRepository, PodRepository,
};
use steward_coordinator::service::FileExtractor;
use steward_coordinator::workflow::StageCoordinator;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "steward_coordinator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Steward Coordinator");

    let config = load_config()?;
    info!(
        "Loaded configuration: pod={}, workflow_run={}, stage={}, log_server_url={}",
        config.pod, config.stage_run.workflow_run, config.stage_run.stage, config.log_server_url
    );

    let extractor = FileExtractor::new(config.container_runtime.clone());
    if let Err(e) = extractor.check_available() {
        warn!("Result files cannot be collected: {:#}", e);
    }

    let client = kube::Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let pods: Arc<dyn PodRepository> =
        Arc::new(KubePodRepository::new(client, &config.pod.namespace));
    let logs: Arc<dyn LogRepository> = Arc::new(HttpLogRepository::new(LogServerClient::new(
        config.log_server_url.clone(),
    )));

    info!("Repositories initialized");

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received shutdown signal, cancelling stage");
            shutdown.cancel();
        }
    });

    let coordinator = StageCoordinator::new(config, pods, logs, extractor);
    if let Err(e) = coordinator.run(&cancel).await {
        error!("Stage coordination failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}

/// Loads and validates configuration from environment variables
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration from environment")?;
    config.validate()?;
    Ok(config)
}
