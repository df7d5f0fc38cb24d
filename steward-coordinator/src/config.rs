//! Coordinator configuration
//!
//! Identifies the pod and stage this coordinator is bound to and the
//! services it talks to. Values come from the environment injected into the
//! coordinator container by the workflow controller.

use std::path::PathBuf;
use std::time::Duration;
use steward_core::domain::pod::PodRef;
use steward_core::dto::log::StageRun;

/// Coordinator configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// The stage pod this coordinator runs in
    pub pod: PodRef,

    /// Namespace under which logs are filed on the log server
    pub meta_namespace: String,

    /// Workflow run and stage being executed
    pub stage_run: StageRun,

    /// Log server base URL (e.g., "http://log-server:7099")
    pub log_server_url: String,

    /// How often container statuses are polled
    pub poll_interval: Duration,

    /// Container runtime CLI used to copy files out of containers
    pub container_runtime: String,

    /// Path of the result file inside workload containers
    pub result_file_path: String,

    /// Local directory result files are extracted into
    pub results_dir: PathBuf,

    /// How long log relays may keep draining after workloads terminate
    pub log_drain_timeout: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(pod: PodRef, stage_run: StageRun, log_server_url: String) -> Self {
        Self {
            meta_namespace: pod.namespace.clone(),
            pod,
            stage_run,
            log_server_url,
            poll_interval: Duration::from_secs(1),
            container_runtime: "docker".to_string(),
            result_file_path: "/steward/results/__result__".to_string(),
            results_dir: PathBuf::from("/tmp/steward/results"),
            log_drain_timeout: Duration::from_secs(30),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - POD_NAME (required)
    /// - POD_NAMESPACE (required)
    /// - WORKFLOWRUN_NAME (required)
    /// - STAGE_NAME (required)
    /// - LOG_SERVER_URL (required)
    /// - META_NAMESPACE (optional, default: POD_NAMESPACE)
    /// - POLL_INTERVAL_MS (optional, milliseconds, default: 1000)
    /// - CONTAINER_RUNTIME (optional, default: docker)
    /// - RESULT_FILE_PATH (optional, default: /steward/results/__result__)
    /// - RESULTS_DIR (optional, default: /tmp/steward/results)
    /// - LOG_DRAIN_TIMEOUT (optional, seconds, default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        let pod_name = required_var("POD_NAME")?;
        let namespace = required_var("POD_NAMESPACE")?;
        let workflow_run = required_var("WORKFLOWRUN_NAME")?;
        let stage = required_var("STAGE_NAME")?;
        let log_server_url = required_var("LOG_SERVER_URL")?;

        let mut config = Self::new(
            PodRef::new(namespace, pod_name),
            StageRun::new(workflow_run, stage),
            log_server_url,
        );

        if let Ok(meta_namespace) = std::env::var("META_NAMESPACE") {
            config.meta_namespace = meta_namespace;
        }

        if let Some(interval) = std::env::var("POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.poll_interval = Duration::from_millis(interval);
        }

        if let Ok(runtime) = std::env::var("CONTAINER_RUNTIME") {
            config.container_runtime = runtime;
        }

        if let Ok(path) = std::env::var("RESULT_FILE_PATH") {
            config.result_file_path = path;
        }

        if let Ok(dir) = std::env::var("RESULTS_DIR") {
            config.results_dir = PathBuf::from(dir);
        }

        if let Some(timeout) = std::env::var("LOG_DRAIN_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.log_drain_timeout = Duration::from_secs(timeout);
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.pod.name.is_empty() || self.pod.namespace.is_empty() {
            anyhow::bail!("pod name and namespace cannot be empty");
        }

        if self.meta_namespace.is_empty() {
            anyhow::bail!("meta_namespace cannot be empty");
        }

        if self.stage_run.workflow_run.is_empty() || self.stage_run.stage.is_empty() {
            anyhow::bail!("workflow run and stage cannot be empty");
        }

        if !self.log_server_url.starts_with("http://")
            && !self.log_server_url.starts_with("https://")
        {
            anyhow::bail!("log_server_url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.container_runtime.is_empty() {
            anyhow::bail!("container_runtime cannot be empty");
        }

        if self.result_file_path.is_empty() {
            anyhow::bail!("result_file_path cannot be empty");
        }

        Ok(())
    }
}

fn required_var(name: &str) -> anyhow::Result<String> {
    std::env::var(name).map_err(|_| anyhow::anyhow!("{} environment variable not set", name))
}
