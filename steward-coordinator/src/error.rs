//! Error types for the coordinator

use steward_client::ClientError;
use steward_core::domain::container::UnsupportedState;
use steward_core::domain::pod::PodRef;
use thiserror::Error;

/// Result type alias for coordinator operations
pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Failure reported by the cluster API
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The object changed since it was read (HTTP 409)
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("kubernetes API error: {0}")]
    Kube(kube::Error),

    #[error("{0}")]
    Other(String),
}

impl From<kube::Error> for ClusterError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(response) if response.code == 409 => {
                ClusterError::Conflict(response.message)
            }
            kube::Error::Api(response) if response.code == 404 => {
                ClusterError::NotFound(response.message)
            }
            other => ClusterError::Kube(other),
        }
    }
}

/// Errors returned by coordinator operations
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("failed to {operation} pod {pod}: {source}")]
    Cluster {
        operation: &'static str,
        pod: PodRef,
        #[source]
        source: ClusterError,
    },

    #[error(transparent)]
    UnsupportedState(#[from] UnsupportedState),

    #[error("failed to open log stream of container {container} in pod {pod}: {source}")]
    OpenLogStream {
        pod: PodRef,
        container: String,
        #[source]
        source: ClusterError,
    },

    #[error("failed to push logs of container {container}: {source}")]
    LogPush {
        container: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to encode stage results: {0}")]
    EncodeResults(#[from] serde_json::Error),

    #[error("failed to copy {container}:{path}: {output}, error: {reason}")]
    Copy {
        container: String,
        path: String,
        output: String,
        reason: String,
    },

    #[error("operation cancelled")]
    Cancelled,
}

impl CoordinatorError {
    pub fn cluster(operation: &'static str, pod: &PodRef, source: ClusterError) -> Self {
        Self::Cluster {
            operation,
            pod: pod.clone(),
            source,
        }
    }

    /// Check if the pod was modified concurrently
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Cluster {
                source: ClusterError::Conflict(_),
                ..
            }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
