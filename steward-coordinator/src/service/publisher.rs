//! Result publisher
//!
//! Stage results are attached to the stage pod as one annotation. Other
//! writers (the kubelet, admission webhooks, the workflow controller) may
//! update the pod at the same time, so every publish is a full
//! read-modify-write cycle retried on version conflicts.

use std::collections::BTreeMap;
use std::sync::Arc;
use steward_core::domain::pod::PodRef;
use steward_core::domain::result::{KeyValue, encode_results};
use steward_core::meta::{ANNOTATION_STAGE_RESULT, is_reserved_annotation};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::retry::{RetryPolicy, retry_on_conflict};
use crate::error::{CoordinatorError, Result};
use crate::repository::PodRepository;

/// Publishes stage results onto the pod's annotations
pub struct ResultPublisher {
    pods: Arc<dyn PodRepository>,
    pod: PodRef,
    retry: RetryPolicy,
}

impl ResultPublisher {
    pub fn new(pods: Arc<dyn PodRepository>, pod: PodRef) -> Self {
        Self::with_retry(pods, pod, RetryPolicy::default())
    }

    pub fn with_retry(pods: Arc<dyn PodRepository>, pod: PodRef, retry: RetryPolicy) -> Self {
        Self { pods, pod, retry }
    }

    /// Replaces the pod's result annotation with `results`.
    pub async fn publish(&self, results: &[KeyValue]) -> Result<()> {
        self.publish_with_cancel(results, &CancellationToken::new())
            .await
    }

    /// Like [`publish`](Self::publish), but stops retrying once `cancel` fires.
    pub async fn publish_with_cancel(
        &self,
        results: &[KeyValue],
        cancel: &CancellationToken,
    ) -> Result<()> {
        let encoded = encode_results(results)?;
        let encoded = encoded.as_str();

        retry_on_conflict(&self.retry, cancel, move || self.publish_once(encoded)).await?;

        info!("Published {} result(s) to pod {}", results.len(), self.pod);
        Ok(())
    }

    async fn publish_once(&self, encoded: &str) -> Result<()> {
        let mut pod = self
            .pods
            .get_pod(&self.pod.name)
            .await
            .map_err(|source| CoordinatorError::cluster("get", &self.pod, source))?;

        let current = pod.metadata.annotations.take().unwrap_or_default();
        pod.metadata.annotations = Some(result_annotations(current, encoded));

        debug!(
            "Updating pod {} at resource version {:?}",
            self.pod, pod.metadata.resource_version
        );

        self.pods
            .replace_pod(&pod)
            .await
            .map_err(|source| CoordinatorError::cluster("update", &self.pod, source))?;

        Ok(())
    }
}

/// Annotation set written back to the pod: the current annotations without
/// platform-reserved keys, plus the encoded result.
fn result_annotations(current: BTreeMap<String, String>, encoded: &str) -> BTreeMap<String, String> {
    let mut annotations: BTreeMap<String, String> = current
        .into_iter()
        .filter(|(key, _)| !is_reserved_annotation(key))
        .collect();

    annotations.insert(ANNOTATION_STAGE_RESULT.to_string(), encoded.to_string());
    annotations
}
