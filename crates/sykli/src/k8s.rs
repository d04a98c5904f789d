//! Kubernetes resource-quantity settings.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static MEMORY_FORMAT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\d+[EPTGMK]i?$").ok());

static CPU_FORMAT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d+m?|\d+\.\d+)$").ok());

/// Resource requests for a task running on a Kubernetes target.
///
/// Empty strings and a zero GPU count mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct K8sOptions {
    /// Memory quantity, e.g. `512Mi` or `4Gi`.
    pub memory: String,
    /// CPU quantity, e.g. `500m`, `2` or `1.5`.
    pub cpu: String,
    /// Number of GPUs.
    pub gpu: u32,
    /// Raw JSON passed through for options the SDK does not model.
    pub raw: String,
}

impl K8sOptions {
    /// Empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the memory quantity.
    pub fn memory(mut self, quantity: impl Into<String>) -> Self {
        self.memory = quantity.into();
        self
    }

    /// Set the CPU quantity.
    pub fn cpu(mut self, quantity: impl Into<String>) -> Self {
        self.cpu = quantity.into();
        self
    }

    /// Set the GPU count.
    pub fn gpu(mut self, count: u32) -> Self {
        self.gpu = count;
        self
    }

    /// Set raw passthrough JSON.
    pub fn raw(mut self, json: impl Into<String>) -> Self {
        self.raw = json.into();
        self
    }

    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty() && self.cpu.is_empty() && self.gpu == 0 && self.raw.is_empty()
    }

    /// The first malformed quantity, as `(field, value, example)`.
    pub(crate) fn invalid_quantity(&self) -> Option<(&'static str, &str, &'static str)> {
        if !self.memory.is_empty() && !matches(&MEMORY_FORMAT, &self.memory) {
            return Some(("memory", &self.memory, "'512Mi', '4Gi'"));
        }
        if !self.cpu.is_empty() && !matches(&CPU_FORMAT, &self.cpu) {
            return Some(("cpu", &self.cpu, "'500m', '2', '1.5'"));
        }
        None
    }

    /// Project onto the IR block. `raw_override` replaces `raw` when non-empty.
    pub(crate) fn to_ir(&self, raw_override: &str) -> Option<sykli_ir::K8s> {
        let raw = if raw_override.is_empty() {
            &self.raw
        } else {
            raw_override
        };
        let block = sykli_ir::K8s {
            memory: non_empty(&self.memory),
            cpu: non_empty(&self.cpu),
            gpu: self.gpu,
            raw: non_empty(raw),
        };
        (block != sykli_ir::K8s::default()).then_some(block)
    }

    /// Pipeline defaults contribute quantities only, never raw JSON.
    pub(crate) fn defaults_to_ir(&self) -> Option<sykli_ir::K8s> {
        Self {
            raw: String::new(),
            ..self.clone()
        }
        .to_ir("")
    }
}

fn matches(format: &LazyLock<Option<Regex>>, value: &str) -> bool {
    format.as_ref().is_some_and(|re| re.is_match(value))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
