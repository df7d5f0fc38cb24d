//! Logs repository
//!
//! Handles pushing log streams to the log collection server.
//! This is a thin wrapper over the HTTP client; relaying policy lives in the
//! service layer.

use async_trait::async_trait;
use steward_client::{ByteStream, ClientError, LogServerClient};
use steward_core::dto::log::LogStreamTarget;
use tokio_util::sync::CancellationToken;

/// Repository trait for the log sink
#[async_trait]
pub trait LogRepository: Send + Sync {
    /// Pushes a byte stream to the sink under `target`
    ///
    /// # Arguments
    /// * `target` - Namespace, workflow run, stage and container keying the stream
    /// * `stream` - The bytes to forward; an empty stream marks end-of-stream
    /// * `cancel` - Stops the push when triggered
    async fn push_log_stream(
        &self,
        target: &LogStreamTarget,
        stream: ByteStream,
        cancel: &CancellationToken,
    ) -> Result<(), ClientError>;
}

/// HTTP implementation of LogRepository
pub struct HttpLogRepository {
    client: LogServerClient,
}

impl HttpLogRepository {
    pub fn new(client: LogServerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogRepository for HttpLogRepository {
    async fn push_log_stream(
        &self,
        target: &LogStreamTarget,
        stream: ByteStream,
        cancel: &CancellationToken,
    ) -> Result<(), ClientError> {
        self.client.push_log_stream(target, stream, cancel).await
    }
}
