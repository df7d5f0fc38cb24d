//! Pods repository
//!
//! Handles the cluster API calls the coordinator makes against its own pod:
//! - Fetching the pod
//! - Replacing the pod (conditioned on its resourceVersion)
//! - Following a container's logs

use async_trait::async_trait;
use futures_util::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::Api;
use kube::api::{LogParams, PostParams};
use steward_client::ByteStream;
use tokio_util::compat::FuturesAsyncReadCompatExt;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::ClusterError;

/// Repository trait for pod operations against the cluster API
///
/// Implementations must be safe to share between tasks.
#[async_trait]
pub trait PodRepository: Send + Sync {
    /// Fetches the current pod object
    async fn get_pod(&self, name: &str) -> Result<Pod, ClusterError>;

    /// Replaces the pod
    ///
    /// The update is rejected with `ClusterError::Conflict` if the pod's
    /// resourceVersion no longer matches the stored object.
    async fn replace_pod(&self, pod: &Pod) -> Result<Pod, ClusterError>;

    /// Opens a follow-mode log stream for one container of the pod
    async fn stream_logs(&self, name: &str, container: &str) -> Result<ByteStream, ClusterError>;
}

/// Kubernetes implementation of PodRepository
pub struct KubePodRepository {
    pods: Api<Pod>,
}

impl KubePodRepository {
    /// Creates a repository for pods in `namespace`
    pub fn new(client: kube::Client, namespace: &str) -> Self {
        Self {
            pods: Api::namespaced(client, namespace),
        }
    }
}

#[async_trait]
impl PodRepository for KubePodRepository {
    async fn get_pod(&self, name: &str) -> Result<Pod, ClusterError> {
        Ok(self.pods.get(name).await?)
    }

    async fn replace_pod(&self, pod: &Pod) -> Result<Pod, ClusterError> {
        let name = pod
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| ClusterError::Other("pod has no name".to_string()))?;

        debug!(
            "Replacing pod {} at resourceVersion {:?}",
            name, pod.metadata.resource_version
        );

        Ok(self.pods.replace(name, &PostParams::default(), pod).await?)
    }

    async fn stream_logs(&self, name: &str, container: &str) -> Result<ByteStream, ClusterError> {
        let params = LogParams {
            container: Some(container.to_string()),
            follow: true,
            ..Default::default()
        };

        let reader = self.pods.log_stream(name, &params).await?;
        Ok(ReaderStream::new(reader.compat()).boxed())
    }
}
