//! IR Schema Types
//!
//! Every optional field is skipped during serialization when it holds its
//! zero value, so a task object only carries what was actually configured.

use crate::{Criticality, GateStrategy, MountType, OnFailAction, SecretSource, SelectMode};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

fn is_zero<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// IR version identifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum IrVersion {
    /// Commands and dependencies only
    #[default]
    #[serde(rename = "1")]
    V1,

    /// Containers, mounts and resources
    #[serde(rename = "2")]
    V2,
}

impl IrVersion {
    /// The wire form of this version.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "1",
            Self::V2 => "2",
        }
    }
}

/// Root IR document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PipelineDocument {
    /// Inferred IR version
    pub version: IrVersion,

    /// Resource registry keyed by resource id (version "2" only)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub resources: IndexMap<String, Resource>,

    /// Tasks in declaration order
    pub tasks: Vec<Task>,
}

impl PipelineDocument {
    /// Look up a task by name.
    #[must_use]
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.name == name)
    }
}

/// A mountable resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Resource {
    /// Source directory, optionally filtered by globs
    Directory {
        /// Host path
        path: String,
        /// Glob filters
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        globs: Vec<String>,
    },

    /// Named cache volume
    Cache {
        /// Cache name
        name: String,
    },
}

/// Task definition in the IR
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Task {
    /// Unique task name
    pub name: String,

    /// Shell command (never present on gates)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Container image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,

    /// Working directory inside the container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,

    /// Environment variables in insertion order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,

    /// Resource mounts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<Mount>,

    /// Input file globs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,

    /// Artifacts consumed from other tasks' outputs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub task_inputs: Vec<TaskInput>,

    /// Output name to path
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, String>,

    /// Task dependencies (must complete before this task runs)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Canonical condition expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,

    /// Plain secret names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<String>,

    /// Typed secret references
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secret_refs: Vec<SecretRef>,

    /// Matrix axes
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub matrix: IndexMap<String, Vec<String>>,

    /// Sidecar services
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,

    /// Retry count
    #[serde(default, skip_serializing_if = "is_zero")]
    pub retry: u32,

    /// Timeout in seconds
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timeout: u64,

    /// Execution target label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Kubernetes resource quantities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k8s: Option<K8s>,

    /// Required runner labels
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,

    /// Capabilities this task provides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<Capability>,

    /// Capabilities this task needs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,

    /// Semantic metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic: Option<Semantic>,

    /// Assistant hooks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_hooks: Option<AiHooks>,

    /// Approval gate configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<Gate>,
}

/// A resource mounted into a task's container
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mount {
    /// Resource id in the registry
    pub resource: String,

    /// Absolute container path
    pub path: String,

    /// Resource kind
    #[serde(rename = "type")]
    pub mount_type: MountType,
}

/// An artifact wired from another task's named output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskInput {
    /// Producing task
    pub from_task: String,
    /// Output name on the producing task
    pub output: String,
    /// Destination path in this task
    pub dest: String,
}

/// Typed secret reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecretRef {
    /// Secret name as seen by the task
    pub name: String,
    /// Resolution source
    pub source: SecretSource,
    /// Source-specific key
    pub key: String,
}

/// Sidecar service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    /// Container image
    pub image: String,
    /// Network alias
    pub name: String,
}

/// Kubernetes resource quantities
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct K8s {
    /// Memory quantity (e.g. "512Mi")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,

    /// CPU quantity (e.g. "500m")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,

    /// GPU count
    #[serde(default, skip_serializing_if = "is_zero")]
    pub gpu: u32,

    /// Raw JSON passed through to the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// A capability offered to tasks that `need` it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Capability {
    /// Capability name
    pub name: String,
    /// Optional value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Semantic metadata block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Semantic {
    /// File patterns this task covers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub covers: Vec<String>,

    /// Human description of the task's purpose
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,

    /// Importance level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criticality: Option<Criticality>,
}

/// Assistant hooks block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AiHooks {
    /// Action on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_fail: Option<OnFailAction>,

    /// Selection mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<SelectMode>,
}

/// Approval gate block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Gate {
    /// Approval strategy
    pub strategy: GateStrategy,

    /// Seconds to wait for approval
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timeout: u64,

    /// Prompt shown to approvers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Variable checked by the `env` strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_var: Option<String>,

    /// File checked by the `file` strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}
