//! Container state waiter
//!
//! The kubelet offers no push notification for container status changes that
//! the coordinator can subscribe to from inside the pod, so it polls the pod
//! at a fixed interval until every selected container reaches the requested
//! milestone.

use k8s_openapi::api::core::v1::Pod;
use std::sync::Arc;
use std::time::Duration;
use steward_core::domain::container::{ContainerSelector, ContainerState, is_selected};
use steward_core::domain::pod::PodRef;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{CoordinatorError, Result};
use crate::repository::PodRepository;

/// Polls a pod until selected containers reach a lifecycle milestone
pub struct ContainerStateWaiter {
    pods: Arc<dyn PodRepository>,
    pod: PodRef,
    poll_interval: Duration,
}

impl ContainerStateWaiter {
    pub fn new(pods: Arc<dyn PodRepository>, pod: PodRef, poll_interval: Duration) -> Self {
        Self {
            pods,
            pod,
            poll_interval,
        }
    }

    /// Waits for a milestone given by name.
    ///
    /// Unknown milestones are rejected before the pod is fetched.
    pub async fn wait_for_state(&self, state: &str, selectors: &[ContainerSelector]) -> Result<()> {
        let expected: ContainerState = state.parse()?;
        self.wait_containers(expected, selectors).await
    }

    /// Blocks until every selected container reaches `expected`.
    ///
    /// There is no timeout: this polls until the milestone is reached or the
    /// pod can no longer be fetched.
    pub async fn wait_containers(
        &self,
        expected: ContainerState,
        selectors: &[ContainerSelector],
    ) -> Result<()> {
        self.wait_containers_with_cancel(expected, selectors, &CancellationToken::new())
            .await
    }

    /// Like [`wait_containers`](Self::wait_containers), but gives up with
    /// `CoordinatorError::Cancelled` once `cancel` fires.
    pub async fn wait_containers_with_cancel(
        &self,
        expected: ContainerState,
        selectors: &[ContainerSelector],
        cancel: &CancellationToken,
    ) -> Result<()> {
        info!(
            "Starting to wait for containers of pod {} to be {} ...",
            self.pod, expected
        );

        // The first tick completes immediately
        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Stopped waiting for containers of pod {}", self.pod);
                    return Err(CoordinatorError::Cancelled);
                }
                _ = ticker.tick() => {}
            }

            let pod = self.pods.get_pod(&self.pod.name).await.map_err(|source| {
                error!("Get pod {} failed: {}", self.pod, source);
                CoordinatorError::cluster("get", &self.pod, source)
            })?;

            let pending = pending_containers(&pod, expected, selectors);
            if pending.is_empty() {
                info!(
                    "All containers of pod {} reached expected status {}",
                    self.pod, expected
                );
                return Ok(());
            }

            for name in pending {
                debug!("Container {} not in expected status {}", name, expected);
            }
        }
    }
}

/// Names of selected containers that have not reached `expected`
fn pending_containers<'a>(
    pod: &'a Pod,
    expected: ContainerState,
    selectors: &[ContainerSelector],
) -> Vec<&'a str> {
    let containers = pod.spec.as_ref().map(|s| s.containers.as_slice()).unwrap_or_default();
    let statuses = pod
        .status
        .as_ref()
        .and_then(|s| s.container_statuses.as_deref())
        .unwrap_or_default();

    containers
        .iter()
        .map(|c| c.name.as_str())
        .filter(|name| is_selected(name, selectors))
        .filter(|name| {
            let status = statuses.iter().find(|s| s.name == *name);
            !expected.is_reached_by(status)
        })
        .collect()
}
