//! Stage coordinator
//!
//! Drives one stage from start to finish: waits for the workload containers
//! to start, relays their logs while they run, waits for them to finish,
//! then collects their result files and publishes them onto the pod.

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Pod;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use steward_core::domain::container::{ContainerSelector, ContainerState, is_selected};
use steward_core::domain::result::{KeyValue, merge_results, parse_results};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::CoordinatorError;
use crate::repository::{LogRepository, PodRepository};
use crate::service::{ContainerStateWaiter, FileExtractor, LogRelay, ResultPublisher};

/// Coordinates the workload containers of one stage pod
pub struct StageCoordinator {
    config: Config,
    pods: Arc<dyn PodRepository>,
    waiter: ContainerStateWaiter,
    relay: Arc<LogRelay>,
    publisher: ResultPublisher,
    extractor: FileExtractor,
}

impl StageCoordinator {
    pub fn new(
        config: Config,
        pods: Arc<dyn PodRepository>,
        logs: Arc<dyn LogRepository>,
        extractor: FileExtractor,
    ) -> Self {
        let waiter =
            ContainerStateWaiter::new(Arc::clone(&pods), config.pod.clone(), config.poll_interval);
        let relay = Arc::new(LogRelay::new(
            Arc::clone(&pods),
            logs,
            config.pod.clone(),
            config.meta_namespace.clone(),
        ));
        let publisher = ResultPublisher::new(Arc::clone(&pods), config.pod.clone());

        Self {
            config,
            pods,
            waiter,
            relay,
            publisher,
            extractor,
        }
    }

    /// Runs the stage to completion and returns the published results
    pub async fn run(&self, cancel: &CancellationToken) -> Result<Vec<KeyValue>> {
        let selectors = [ContainerSelector::workload()];
        let run = &self.config.stage_run;

        info!(
            "Coordinating stage {} of workflow run {} in pod {}",
            run.stage, run.workflow_run, self.config.pod
        );

        self.waiter
            .wait_containers_with_cancel(ContainerState::Initialized, &selectors, cancel)
            .await
            .context("Failed waiting for workload containers to start")?;

        let pod = self.fetch_pod().await?;
        let workloads = workload_containers(&pod, &selectors);
        info!("Relaying logs of {} workload container(s)", workloads.len());

        let relay_cancel = cancel.child_token();
        let relays: Vec<_> = workloads
            .iter()
            .map(|container| (container.clone(), self.spawn_relay(container, &relay_cancel)))
            .collect();

        let waited = self
            .waiter
            .wait_containers_with_cancel(ContainerState::Terminated, &selectors, cancel)
            .await;
        if let Err(e) = waited {
            relay_cancel.cancel();
            return Err(e).context("Failed waiting for workload containers to finish");
        }

        self.drain_relays(relays, &relay_cancel).await;

        self.relay
            .mark_end_of_stream(run, cancel)
            .await
            .context("Failed to mark end of stage logs")?;

        let pod = self.fetch_pod().await?;
        let mut results = Vec::new();
        for container in &workloads {
            let id = container_id(&pod, container);
            merge_results(&mut results, self.collect_results(container, &id).await);
        }

        self.publisher
            .publish_with_cancel(&results, cancel)
            .await
            .context("Failed to publish stage results")?;

        info!(
            "Stage {} of workflow run {} completed with {} result(s)",
            run.stage,
            run.workflow_run,
            results.len()
        );
        Ok(results)
    }

    async fn fetch_pod(&self) -> Result<Pod> {
        self.pods
            .get_pod(&self.config.pod.name)
            .await
            .map_err(|source| CoordinatorError::cluster("get", &self.config.pod, source))
            .context("Failed to fetch stage pod")
    }

    fn spawn_relay(
        &self,
        container: &str,
        cancel: &CancellationToken,
    ) -> JoinHandle<crate::error::Result<()>> {
        let relay = Arc::clone(&self.relay);
        let container = container.to_string();
        let run = self.config.stage_run.clone();
        let cancel = cancel.clone();

        tokio::spawn(async move { relay.stream_logs(&container, &run, &cancel).await })
    }

    /// Waits for relays to finish, cancelling those still running once the
    /// drain timeout passes. Relay failures are logged only.
    async fn drain_relays(
        &self,
        relays: Vec<(String, JoinHandle<crate::error::Result<()>>)>,
        cancel: &CancellationToken,
    ) {
        let deadline = Instant::now() + self.config.log_drain_timeout;

        for (container, mut handle) in relays {
            let joined = match time::timeout_at(deadline, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    if !cancel.is_cancelled() {
                        warn!(
                            "Log relays still running after {:?}, cancelling",
                            self.config.log_drain_timeout
                        );
                        cancel.cancel();
                    }
                    handle.await
                }
            };

            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_cancelled() => {
                    warn!("Log relay of container {} was cancelled", container)
                }
                Ok(Err(e)) => warn!("Log relay of container {} failed: {}", container, e),
                Err(e) => warn!("Log relay task of container {} panicked: {}", container, e),
            }
        }
    }

    /// Copies the result file out of a container and parses it. A container
    /// without a result file contributes nothing.
    async fn collect_results(&self, container: &str, container_id: &str) -> Vec<KeyValue> {
        let Some(file_name) = Path::new(&self.config.result_file_path).file_name() else {
            warn!(
                "Result file path {} has no file name",
                self.config.result_file_path
            );
            return Vec::new();
        };

        let dst = self.config.results_dir.join(container);
        if let Err(e) = tokio::fs::create_dir_all(&dst).await {
            warn!("Failed to create {}: {}", dst.display(), e);
            return Vec::new();
        }

        let extractor = self.extractor.clone();
        let id = container_id.to_string();
        let path = self.config.result_file_path.clone();
        let target: PathBuf = dst.clone();
        let copied =
            tokio::task::spawn_blocking(move || extractor.copy_from_container(&id, &path, &target))
                .await;

        match copied {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("No results collected from container {}: {}", container, e);
                return Vec::new();
            }
            Err(e) => {
                warn!("Result copy task of container {} panicked: {}", container, e);
                return Vec::new();
            }
        }

        let file = dst.join(file_name);
        match tokio::fs::read_to_string(&file).await {
            Ok(text) => {
                let values = parse_results(&text);
                debug!("Container {} reported {} result(s)", container, values.len());
                values
            }
            Err(e) => {
                warn!("Failed to read result file {}: {}", file.display(), e);
                Vec::new()
            }
        }
    }
}

/// Selected container names in pod spec order
fn workload_containers(pod: &Pod, selectors: &[ContainerSelector]) -> Vec<String> {
    pod.spec
        .iter()
        .flat_map(|spec| spec.containers.iter())
        .filter(|c| is_selected(&c.name, selectors))
        .map(|c| c.name.clone())
        .collect()
}

/// Runtime ID of a container, without the `<runtime>://` scheme. Falls back
/// to the container name when the status carries no ID yet.
fn container_id(pod: &Pod, container: &str) -> String {
    pod.status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .and_then(|statuses| statuses.iter().find(|s| s.name == container))
        .and_then(|s| s.container_id.as_deref())
        .filter(|id| !id.is_empty())
        .map(|id| id.split_once("://").map_or(id, |(_, id)| id).to_string())
        .unwrap_or_else(|| container.to_string())
}
