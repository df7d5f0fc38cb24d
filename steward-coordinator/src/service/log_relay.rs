//! Log relay
//!
//! Forwards a container's live log output to the log server, and marks the
//! end of a stage's logs once the caller knows the stage is over.
//!
//! A container's log stream closing only says that one container stopped
//! writing. The end-of-stream marker is therefore a separate call, made after
//! the workload containers are observed terminated.

use std::sync::Arc;
use steward_client::{ByteStream, ClientError, empty_stream};
use steward_core::domain::pod::PodRef;
use steward_core::dto::log::{LogStreamTarget, StageRun};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{CoordinatorError, Result};
use crate::repository::{LogRepository, PodRepository};

/// Relays container logs of one pod to the log sink
pub struct LogRelay {
    pods: Arc<dyn PodRepository>,
    logs: Arc<dyn LogRepository>,
    pod: PodRef,
    /// Namespace logs are filed under on the log server
    meta_namespace: String,
}

impl LogRelay {
    pub fn new(
        pods: Arc<dyn PodRepository>,
        logs: Arc<dyn LogRepository>,
        pod: PodRef,
        meta_namespace: String,
    ) -> Self {
        Self {
            pods,
            logs,
            pod,
            meta_namespace,
        }
    }

    /// Streams a container's logs to the sink until the stream ends.
    ///
    /// Returns `CoordinatorError::Cancelled` if `cancel` fires before the
    /// push completes; the log stream is released either way.
    pub async fn stream_logs(
        &self,
        container: &str,
        run: &StageRun,
        cancel: &CancellationToken,
    ) -> Result<()> {
        info!("Start to collect {} log", container);

        let stream = tokio::select! {
            biased;
            opened = self.pods.stream_logs(&self.pod.name, container) => {
                opened.map_err(|source| CoordinatorError::OpenLogStream {
                    pod: self.pod.clone(),
                    container: container.to_string(),
                    source,
                })?
            }
            _ = cancel.cancelled() => return Err(CoordinatorError::Cancelled),
        };

        let target = LogStreamTarget::new(&self.meta_namespace, run, container);
        let result = self.push(&target, stream, cancel).await;
        debug!("Log stream of container {} in pod {} released", container, self.pod);

        result?;
        info!("Finished collecting {} log", container);
        Ok(())
    }

    /// Marks the end of a stage's logs with an empty push under the
    /// reserved end-of-stream container name.
    pub async fn mark_end_of_stream(&self, run: &StageRun, cancel: &CancellationToken) -> Result<()> {
        let target = LogStreamTarget::end_of_stream(&self.meta_namespace, run);
        self.push(&target, empty_stream(), cancel).await?;

        info!(
            "Marked end of logs for stage {} of workflow run {}",
            run.stage, run.workflow_run
        );
        Ok(())
    }

    async fn push(
        &self,
        target: &LogStreamTarget,
        stream: ByteStream,
        cancel: &CancellationToken,
    ) -> Result<()> {
        // A push that already finished wins over a concurrent cancel
        let pushed = tokio::select! {
            biased;
            pushed = self.logs.push_log_stream(target, stream, cancel) => pushed,
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
        };

        pushed.map_err(|source| match source {
            ClientError::Cancelled => CoordinatorError::Cancelled,
            source => CoordinatorError::LogPush {
                container: target.container.clone(),
                source,
            },
        })
    }
}
