//! Container lifecycle types
//!
//! A stage pod runs workload containers next to Steward's own sidecars. The
//! coordinator picks the containers it cares about with [`ContainerSelector`]s
//! and waits for them to reach a [`ContainerState`] milestone.

use k8s_openapi::api::core::v1::ContainerStatus;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::meta::{
    COORDINATOR_CONTAINER_NAME, DOCKER_IN_DOCKER_CONTAINER_NAME, SIDECAR_PREFIX,
};

/// Lifecycle milestone a container can be waited for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerState {
    /// The container has left the waiting state (running or terminated)
    Initialized,
    /// The container has terminated
    Terminated,
}

impl ContainerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerState::Initialized => "Initialized",
            ContainerState::Terminated => "Terminated",
        }
    }

    /// Checks whether an observed container status satisfies this milestone.
    ///
    /// A container with no status entry yet has not reached any milestone.
    pub fn is_reached_by(&self, status: Option<&ContainerStatus>) -> bool {
        let Some(state) = status.and_then(|s| s.state.as_ref()) else {
            return false;
        };

        match self {
            ContainerState::Terminated => state.terminated.is_some(),
            ContainerState::Initialized => state.running.is_some() || state.terminated.is_some(),
        }
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested milestone is neither `Initialized` nor `Terminated`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported state: {0}, only support: Terminated, Initialized")]
pub struct UnsupportedState(pub String);

impl FromStr for ContainerState {
    type Err = UnsupportedState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Initialized" => Ok(ContainerState::Initialized),
            "Terminated" => Ok(ContainerState::Terminated),
            other => Err(UnsupportedState(other.to_string())),
        }
    }
}

/// Predicate over container names
///
/// A container is selected when at least one selector in a set matches it.
#[derive(Clone)]
pub struct ContainerSelector {
    description: String,
    matcher: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

impl ContainerSelector {
    /// Selects containers accepted by an arbitrary predicate
    pub fn from_fn<F>(description: impl Into<String>, matcher: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            matcher: Arc::new(matcher),
        }
    }

    /// Selects exactly one container by name
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let description = format!("name={}", name);
        Self::from_fn(description, move |candidate| candidate == name)
    }

    /// Selects containers whose name starts with `prefix`
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let description = format!("prefix={}", prefix);
        Self::from_fn(description, move |candidate| candidate.starts_with(&prefix))
    }

    /// Selects every container except the coordinator
    pub fn non_coordinator() -> Self {
        Self::from_fn("non-coordinator", |candidate| {
            candidate != COORDINATOR_CONTAINER_NAME
        })
    }

    /// Selects every container that is not a Steward sidecar
    pub fn non_sidecar() -> Self {
        Self::from_fn("non-sidecar", |candidate| !candidate.starts_with(SIDECAR_PREFIX))
    }

    /// Selects every container except the docker-in-docker sidecar
    pub fn non_docker_in_docker() -> Self {
        Self::from_fn("non-dind", |candidate| {
            candidate != DOCKER_IN_DOCKER_CONTAINER_NAME
        })
    }

    /// Selects the user's workload containers.
    ///
    /// The coordinator and docker-in-docker containers carry the sidecar
    /// prefix, so excluding sidecars excludes them too.
    pub fn workload() -> Self {
        let non_sidecar = Self::non_sidecar();
        Self::from_fn("workload", move |candidate| non_sidecar.matches(candidate))
    }

    pub fn matches(&self, name: &str) -> bool {
        (self.matcher)(name)
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for ContainerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContainerSelector")
            .field(&self.description)
            .finish()
    }
}

impl From<&str> for ContainerSelector {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for ContainerSelector {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

/// Checks whether a container name is part of the selection
pub fn is_selected(name: &str, selectors: &[ContainerSelector]) -> bool {
    selectors.iter().any(|selector| selector.matches(name))
}
