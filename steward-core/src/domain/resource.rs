//! `Resource` custom resource
//!
//! Describes a reusable workflow resource (an image, a git repository, ...)
//! and the resolver image that knows how to pull or push it. The coordinator
//! does not consume these; they are read by the provisioning side.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Specification of a workflow resource
#[derive(CustomResource, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "steward.dev",
    version = "v1alpha1",
    kind = "Resource",
    plural = "resources",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// Image used to resolve this kind of resource
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resolver: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Whether to persist the resource to dedicated storage
    #[serde(default)]
    pub persistent: bool,
    #[serde(default)]
    pub pull_policy: PullPolicy,
    #[serde(default)]
    pub parameters: Vec<ParameterItem>,
}

/// Kind of data a resource carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum ResourceType {
    Image,
    Git,
    #[serde(rename = "KV")]
    Kv,
    #[serde(rename = "PV")]
    Pv,
    #[default]
    General,
}

/// When the resolver should pull data that may already be present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum PullPolicy {
    Always,
    #[default]
    IfNotExist,
}

/// A named resource parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ParameterItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// String did not name a known variant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "Image",
            ResourceType::Git => "Git",
            ResourceType::Kv => "KV",
            ResourceType::Pv => "PV",
            ResourceType::General => "General",
        }
    }
}

impl FromStr for ResourceType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Image" => Ok(ResourceType::Image),
            "Git" => Ok(ResourceType::Git),
            "KV" => Ok(ResourceType::Kv),
            "PV" => Ok(ResourceType::Pv),
            "General" => Ok(ResourceType::General),
            other => Err(UnknownVariant {
                kind: "resource type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PullPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullPolicy::Always => "Always",
            PullPolicy::IfNotExist => "IfNotExist",
        }
    }
}

impl FromStr for PullPolicy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Always" => Ok(PullPolicy::Always),
            "IfNotExist" => Ok(PullPolicy::IfNotExist),
            other => Err(UnknownVariant {
                kind: "pull policy",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for PullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ResourceSpec {
    /// Looks up a parameter value by name
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.as_deref())
    }
}
