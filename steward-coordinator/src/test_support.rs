//! Test-only fakes for the cluster API and the log sink.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use k8s_openapi::api::core::v1::{
    Container, ContainerState, ContainerStateRunning, ContainerStateTerminated,
    ContainerStateWaiting, ContainerStatus, Pod, PodSpec, PodStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use steward_client::{ByteStream, ClientError};
use steward_core::dto::log::LogStreamTarget;
use tokio_util::sync::CancellationToken;

use crate::error::ClusterError;
use crate::repository::{LogRepository, PodRepository};

pub const NAMESPACE: &str = "ci";
pub const POD_NAME: &str = "wfr-1-build";

/// Build a pod with the given containers and no statuses.
pub fn pod(containers: &[&str]) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(POD_NAME.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            resource_version: Some("1".to_string()),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: containers
                .iter()
                .map(|name| Container {
                    name: name.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }),
        status: Some(PodStatus::default()),
    }
}

/// Attach container statuses to a pod.
pub fn with_statuses(mut pod: Pod, statuses: Vec<ContainerStatus>) -> Pod {
    pod.status = Some(PodStatus {
        container_statuses: Some(statuses),
        ..Default::default()
    });
    pod
}

/// Attach annotations to a pod.
pub fn with_annotations(mut pod: Pod, annotations: &[(&str, &str)]) -> Pod {
    pod.metadata.annotations = Some(
        annotations
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    );
    pod
}

fn status(name: &str, state: ContainerState) -> ContainerStatus {
    ContainerStatus {
        name: name.to_string(),
        container_id: Some(format!("docker://{}-id", name)),
        state: Some(state),
        ..Default::default()
    }
}

pub fn waiting(name: &str) -> ContainerStatus {
    status(
        name,
        ContainerState {
            waiting: Some(ContainerStateWaiting::default()),
            ..Default::default()
        },
    )
}

pub fn running(name: &str) -> ContainerStatus {
    status(
        name,
        ContainerState {
            running: Some(ContainerStateRunning::default()),
            ..Default::default()
        },
    )
}

pub fn terminated(name: &str) -> ContainerStatus {
    status(
        name,
        ContainerState {
            terminated: Some(ContainerStateTerminated {
                exit_code: 0,
                ..Default::default()
            }),
            ..Default::default()
        },
    )
}

enum LogSource {
    Chunks(Vec<&'static str>),
    Endless(Duration),
}

#[derive(Default)]
struct PodState {
    /// Snapshots returned by successive gets, the last one sticks
    snapshots: VecDeque<Pod>,
    gets: usize,
    replaces: usize,
    fail_gets: bool,
    conflicts_to_inject: usize,
    concurrent_write: Option<(String, String)>,
    logs: HashMap<String, LogSource>,
}

/// In-memory PodRepository with optimistic concurrency on replace
pub struct FakePodRepository {
    state: Mutex<PodState>,
}

impl FakePodRepository {
    pub fn new(pod: Pod) -> Self {
        Self::with_snapshots(vec![pod])
    }

    /// Successive `get_pod` calls walk through `snapshots`
    pub fn with_snapshots(snapshots: Vec<Pod>) -> Self {
        Self {
            state: Mutex::new(PodState {
                snapshots: snapshots.into(),
                ..Default::default()
            }),
        }
    }

    pub fn fail_gets(self) -> Self {
        self.state.lock().unwrap().fail_gets = true;
        self
    }

    /// Simulates another writer updating the pod between our get and replace
    pub fn inject_conflicts(self, count: usize, key: &str, value: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.conflicts_to_inject = count;
            state.concurrent_write = Some((key.to_string(), value.to_string()));
        }
        self
    }

    pub fn with_logs(self, container: &str, chunks: Vec<&'static str>) -> Self {
        self.state
            .lock()
            .unwrap()
            .logs
            .insert(container.to_string(), LogSource::Chunks(chunks));
        self
    }

    /// Logs that never end, one chunk per `period`
    pub fn with_endless_logs(self, container: &str, period: Duration) -> Self {
        self.state
            .lock()
            .unwrap()
            .logs
            .insert(container.to_string(), LogSource::Endless(period));
        self
    }

    pub fn get_count(&self) -> usize {
        self.state.lock().unwrap().gets
    }

    pub fn replace_count(&self) -> usize {
        self.state.lock().unwrap().replaces
    }

    /// Annotations of the stored pod
    pub fn annotations(&self) -> BTreeMap<String, String> {
        let state = self.state.lock().unwrap();
        state
            .snapshots
            .front()
            .and_then(|pod| pod.metadata.annotations.clone())
            .unwrap_or_default()
    }
}

fn bump_version(pod: &mut Pod) {
    let version = pod
        .metadata
        .resource_version
        .as_deref()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    pod.metadata.resource_version = Some((version + 1).to_string());
}

#[async_trait]
impl PodRepository for FakePodRepository {
    async fn get_pod(&self, name: &str) -> Result<Pod, ClusterError> {
        let mut state = self.state.lock().unwrap();
        state.gets += 1;

        if state.fail_gets {
            return Err(ClusterError::Other("connection refused".to_string()));
        }

        let pod = match state.snapshots.front() {
            Some(pod) if pod.metadata.name.as_deref() == Some(name) => Ok(pod.clone()),
            _ => Err(ClusterError::NotFound(format!("pods \"{}\" not found", name))),
        };

        if state.snapshots.len() > 1 {
            state.snapshots.pop_front();
        }
        pod
    }

    async fn replace_pod(&self, pod: &Pod) -> Result<Pod, ClusterError> {
        let mut state = self.state.lock().unwrap();
        state.replaces += 1;

        if state.conflicts_to_inject > 0 {
            state.conflicts_to_inject -= 1;
            let write = state.concurrent_write.clone();
            if let Some(stored) = state.snapshots.front_mut() {
                if let Some((key, value)) = write {
                    stored
                        .metadata
                        .annotations
                        .get_or_insert_with(BTreeMap::new)
                        .insert(key, value);
                }
                bump_version(stored);
            }
        }

        let stored = state
            .snapshots
            .front_mut()
            .ok_or_else(|| ClusterError::NotFound("pod".to_string()))?;

        if stored.metadata.resource_version != pod.metadata.resource_version {
            return Err(ClusterError::Conflict(
                "the object has been modified; please apply your changes to the latest version"
                    .to_string(),
            ));
        }

        let mut updated = pod.clone();
        bump_version(&mut updated);
        *stored = updated.clone();
        Ok(updated)
    }

    async fn stream_logs(&self, _name: &str, container: &str) -> Result<ByteStream, ClusterError> {
        let state = self.state.lock().unwrap();
        match state.logs.get(container) {
            Some(LogSource::Chunks(chunks)) => Ok(futures_util::stream::iter(
                chunks
                    .iter()
                    .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                    .collect::<Vec<_>>(),
            )
            .boxed()),
            Some(LogSource::Endless(period)) => {
                let period = *period;
                Ok(futures_util::stream::unfold(0u64, move |n| async move {
                    tokio::time::sleep(period).await;
                    Some((Ok(Bytes::from(format!("line {}\n", n))), n + 1))
                })
                .boxed())
            }
            None => Err(ClusterError::NotFound(format!(
                "container {} is not valid for pod",
                container
            ))),
        }
    }
}

/// A completed push recorded by the fake sink
#[derive(Debug, Clone)]
pub struct RecordedPush {
    pub target: LogStreamTarget,
    pub body: Vec<u8>,
}

/// In-memory LogRepository that drains and records every stream
#[derive(Default)]
pub struct FakeLogRepository {
    pushes: Mutex<Vec<RecordedPush>>,
    chunks: Arc<AtomicUsize>,
    fail_status: Option<u16>,
}

impl FakeLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Default::default()
        }
    }

    pub fn pushes(&self) -> Vec<RecordedPush> {
        self.pushes.lock().unwrap().clone()
    }

    /// Number of chunks received so far, including from unfinished pushes
    pub fn chunks_received(&self) -> usize {
        self.chunks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogRepository for FakeLogRepository {
    async fn push_log_stream(
        &self,
        target: &LogStreamTarget,
        mut stream: ByteStream,
        cancel: &CancellationToken,
    ) -> Result<(), ClientError> {
        if let Some(status) = self.fail_status {
            return Err(ClientError::api_error(status, "log server unavailable"));
        }

        let mut body = Vec::new();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                next = stream.next() => match next {
                    Some(Ok(chunk)) => {
                        self.chunks.fetch_add(1, Ordering::SeqCst);
                        body.extend_from_slice(&chunk);
                    }
                    Some(Err(e)) => return Err(ClientError::api_error(500, e.to_string())),
                    None => break,
                },
            }
        }

        self.pushes.lock().unwrap().push(RecordedPush {
            target: target.clone(),
            body,
        });
        Ok(())
    }
}
