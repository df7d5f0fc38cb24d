//! Steward Log Client
//!
//! HTTP client for the log collection server that stores stage logs.
//!
//! The coordinator streams each workload container's output to the server as
//! it is produced, then pushes an empty end-of-stream marker once the stage is
//! known to be finished.
//!
//! # Example
//!
//! ```no_run
//! use futures_util::StreamExt;
//! use steward_client::LogServerClient;
//! use steward_core::dto::log::{LogStreamTarget, StageRun};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> steward_client::Result<()> {
//!     let client = LogServerClient::new("http://log-server:7099");
//!     let run = StageRun::new("wfr-1", "build");
//!     let body = futures_util::stream::iter(vec![Ok(bytes::Bytes::from("hello\n"))]).boxed();
//!
//!     client
//!         .push_log_stream(
//!             &LogStreamTarget::new("tenant", &run, "main"),
//!             body,
//!             &CancellationToken::new(),
//!         )
//!         .await
//! }
//! ```

pub mod error;
mod logs;

pub use error::{ClientError, Result};

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::Client;

/// Stream of raw log bytes pushed to the server
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// A stream with no bytes, the body of an end-of-stream marker
pub fn empty_stream() -> ByteStream {
    futures_util::stream::empty().boxed()
}

/// HTTP client for the log collection server
#[derive(Debug, Clone)]
pub struct LogServerClient {
    /// Base URL of the log server (e.g., "http://log-server:7099")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl LogServerClient {
    /// Create a new log server client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the log server
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// Log pushes are long-lived, so do not configure a whole-request timeout
    /// on `client`.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the log server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Handle an API response that returns no content
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = LogServerClient::new("http://localhost:7099");
        assert_eq!(client.base_url(), "http://localhost:7099");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = LogServerClient::new("http://localhost:7099/");
        assert_eq!(client.base_url(), "http://localhost:7099");
    }

    #[tokio::test]
    async fn test_empty_stream_yields_nothing() {
        assert!(empty_stream().next().await.is_none());
    }
}
