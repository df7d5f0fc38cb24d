//! Log stream DTOs

use serde::{Deserialize, Serialize};

use crate::meta::END_OF_STREAM_CONTAINER_NAME;

/// Identifies a workflow stage run whose logs are being collected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRun {
    pub workflow_run: String,
    pub stage: String,
}

impl StageRun {
    pub fn new(workflow_run: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            workflow_run: workflow_run.into(),
            stage: stage.into(),
        }
    }
}

/// Key under which the log server stores one stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStreamTarget {
    pub namespace: String,
    pub workflow_run: String,
    pub stage: String,
    pub container: String,
}

impl LogStreamTarget {
    pub fn new(namespace: impl Into<String>, run: &StageRun, container: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            workflow_run: run.workflow_run.clone(),
            stage: run.stage.clone(),
            container: container.into(),
        }
    }

    /// Target of the end-of-stream marker for a stage
    pub fn end_of_stream(namespace: impl Into<String>, run: &StageRun) -> Self {
        Self::new(namespace, run, END_OF_STREAM_CONTAINER_NAME)
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.container == END_OF_STREAM_CONTAINER_NAME
    }
}
