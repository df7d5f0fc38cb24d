//! Well-known metadata keys and reserved container names
//!
//! Everything a controller needs to agree on with the coordinator lives here.

/// Annotation under which a stage's results are stored on its pod.
///
/// The value is a JSON array of `{"key": .., "value": ..}` objects.
pub const ANNOTATION_STAGE_RESULT: &str = "stage.steward.dev/execution-result";

/// Prefix of per-container seccomp annotations injected by the platform.
///
/// Re-submitting these on a pod update can be rejected by admission control,
/// so the coordinator never copies them forward.
pub const ANNOTATION_SECCOMP_CONTAINER_PREFIX: &str =
    "container.seccomp.security.alpha.kubernetes.io/";

/// Prefix shared by every container Steward injects into a stage pod.
pub const SIDECAR_PREFIX: &str = "steward-";

/// Name of the coordinator container itself.
pub const COORDINATOR_CONTAINER_NAME: &str = "steward-coordinator";

/// Name of the docker-in-docker sidecar.
pub const DOCKER_IN_DOCKER_CONTAINER_NAME: &str = "steward-dind";

/// Container name used when marking the end of a stage's log stream.
pub const END_OF_STREAM_CONTAINER_NAME: &str = "stage-eof";

/// Returns true if the annotation key is owned by the platform.
pub fn is_reserved_annotation(key: &str) -> bool {
    key.starts_with(ANNOTATION_SECCOMP_CONTAINER_PREFIX)
}
