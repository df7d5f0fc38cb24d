//! Log streaming endpoints

use reqwest::Body;
use reqwest::header::CONTENT_TYPE;
use steward_core::dto::log::LogStreamTarget;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::{ByteStream, LogServerClient};

impl LogServerClient {
    /// Stream log bytes to the server
    ///
    /// The body is forwarded chunk by chunk as `stream` yields it; the call
    /// completes once the stream ends and the server acknowledges the upload.
    /// If `cancel` fires first the request and the stream are dropped and
    /// `ClientError::Cancelled` is returned.
    ///
    /// # Arguments
    /// * `target` - Namespace, workflow run, stage and container keying the stream
    /// * `stream` - The log bytes
    /// * `cancel` - Stops the push when triggered
    pub async fn push_log_stream(
        &self,
        target: &LogStreamTarget,
        stream: ByteStream,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let url = format!(
            "{}/apis/v1alpha1/workflowruns/{}/streamlogs",
            self.base_url, target.workflow_run
        );

        let request = self
            .client
            .post(&url)
            .query(&[
                ("namespace", target.namespace.as_str()),
                ("stage", target.stage.as_str()),
                ("container", target.container.as_str()),
            ])
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(Body::wrap_stream(stream))
            .send();

        tokio::select! {
            biased;
            response = request => {
                let response = response?;
                self.handle_empty_response(response).await
            }
            _ = cancel.cancelled() => {
                debug!(
                    "Log push for {}/{}/{} cancelled",
                    target.workflow_run, target.stage, target.container
                );
                Err(ClientError::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::empty_stream;
    use bytes::Bytes;
    use futures_util::StreamExt;
    use steward_core::dto::log::StageRun;
    use std::time::Duration;
    use steward_core::meta::END_OF_STREAM_CONTAINER_NAME;
    use wiremock::matchers::{body_string, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chunks(parts: &[&'static str]) -> ByteStream {
        futures_util::stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(p.as_bytes())))
                .collect::<Vec<_>>(),
        )
        .boxed()
    }

    #[tokio::test]
    async fn test_push_log_stream_forwards_bytes_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apis/v1alpha1/workflowruns/wfr-1/streamlogs"))
            .and(query_param("namespace", "tenant"))
            .and(query_param("stage", "build"))
            .and(query_param("container", "main"))
            .and(body_string("line one\nline two\n"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = LogServerClient::new(server.uri());
        let run = StageRun::new("wfr-1", "build");
        let target = LogStreamTarget::new("tenant", &run, "main");

        client
            .push_log_stream(
                &target,
                chunks(&["line one\n", "line two\n"]),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_push_end_of_stream_marker_sends_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apis/v1alpha1/workflowruns/wfr-1/streamlogs"))
            .and(query_param("container", END_OF_STREAM_CONTAINER_NAME))
            .and(body_string(""))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = LogServerClient::new(server.uri());
        let target = LogStreamTarget::end_of_stream("tenant", &StageRun::new("wfr-1", "build"));
        client
            .push_log_stream(&target, empty_stream(), &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_push_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("disk full"))
            .mount(&server)
            .await;

        let client = LogServerClient::new(server.uri());
        let run = StageRun::new("wfr-1", "build");
        let err = client
            .push_log_stream(
                &LogStreamTarget::new("tenant", &run, "main"),
                chunks(&["x"]),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(err.is_server_error());
        assert!(err.to_string().contains("disk full"));
    }

    #[tokio::test]
    async fn test_push_cancelled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
            .mount(&server)
            .await;

        let client = LogServerClient::new(server.uri());
        let run = StageRun::new("wfr-1", "build");
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            client.push_log_stream(
                &LogStreamTarget::new("tenant", &run, "main"),
                chunks(&["x"]),
                &cancel,
            ),
        )
        .await
        .expect("push should stop promptly after cancellation");

        assert!(result.unwrap_err().is_cancelled());
    }
}
