//! Graph-level validation.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. every non-gate task has a command
//! 2. every dependency names a registered task
//! 3. the dependency graph is acyclic
//! 4. Kubernetes quantities are well formed

use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::similarity::best_match;
use crate::task::DependencyView;
use miette::Diagnostic;
use std::fmt;
use sykli_task_graph::TaskGraph;
use thiserror::Error;
use tracing::debug;

/// Stable machine-readable validation failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// A non-gate task without a command
    MissingCommand,
    /// A dependency on a name no task or gate has
    UnknownDependency,
    /// A dependency cycle
    CycleDetected,
    /// A malformed Kubernetes quantity
    InvalidK8s,
}

impl ValidationErrorKind {
    /// The wire code, e.g. `UNKNOWN_DEPENDENCY`.
    #[must_use]
    pub const fn wire_code(self) -> &'static str {
        match self {
            Self::MissingCommand => "MISSING_COMMAND",
            Self::UnknownDependency => "UNKNOWN_DEPENDENCY",
            Self::CycleDetected => "CYCLE_DETECTED",
            Self::InvalidK8s => "INVALID_K8S",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_code())
    }
}

/// A structural problem found by [`Pipeline::validate`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// What went wrong
    pub kind: ValidationErrorKind,
    /// The offending task; for cycles, the task that closes the cycle
    pub task: String,
    /// Human-readable description
    pub message: String,
    /// Closest existing task name for an unknown dependency
    pub suggestion: Option<String>,
    /// The cycle path, first node repeated at the end
    pub cycle: Vec<String>,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, task: &str, message: String) -> Self {
        Self {
            kind,
            task: task.to_string(),
            message,
            suggestion: None,
            cycle: Vec::new(),
        }
    }

    /// The wire code of this error's kind.
    #[must_use]
    pub const fn wire_code(&self) -> &'static str {
        self.kind.wire_code()
    }
}

impl Diagnostic for ValidationError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("sykli::validate::{}", self.kind.wire_code())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let suggestion = self.suggestion.as_ref()?;
        Some(Box::new(format!("did you mean '{suggestion}'?")))
    }
}

impl Pipeline {
    /// Check the pipeline's structure, reporting the first problem found.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        self.check_commands()?;
        self.check_dependencies()?;
        self.check_cycles()?;
        self.check_k8s()?;
        debug!("Validated pipeline with {} tasks", self.tasks.len());
        Ok(())
    }

    /// Validate, then group tasks into levels that can run concurrently.
    ///
    /// Every task's dependencies sit in earlier levels; each level lists
    /// tasks in declaration order.
    pub fn execution_levels(&self) -> Result<Vec<Vec<String>>> {
        self.validate()?;
        let mut graph = self.dependency_graph();
        graph.add_dependency_edges()?;
        let levels = graph
            .get_parallel_groups()?
            .into_iter()
            .map(|group| group.into_iter().map(|node| node.name).collect())
            .collect();
        Ok(levels)
    }

    fn dependency_graph(&self) -> TaskGraph<DependencyView<'_>> {
        let mut graph = TaskGraph::new();
        for task in &self.tasks {
            let view = DependencyView {
                depends_on: &task.depends_on,
            };
            // Names are unique, so registration cannot collide.
            let _ = graph.add_task(&task.name, view);
        }
        graph
    }

    fn check_commands(&self) -> std::result::Result<(), ValidationError> {
        for task in &self.tasks {
            if !task.is_gate() && task.command.as_deref().is_none_or(str::is_empty) {
                return Err(ValidationError::new(
                    ValidationErrorKind::MissingCommand,
                    &task.name,
                    format!("task '{}' has no command", task.name),
                ));
            }
        }
        Ok(())
    }

    fn check_dependencies(&self) -> std::result::Result<(), ValidationError> {
        for task in &self.tasks {
            for dep in &task.depends_on {
                if self.contains_task(dep) {
                    continue;
                }
                let suggestion = best_match(dep, self.task_names()).map(str::to_string);
                let mut message = format!("task '{}' depends on unknown task '{}'", task.name, dep);
                if let Some(s) = &suggestion {
                    message.push_str(&format!(" (did you mean '{s}'?)"));
                }
                let mut err =
                    ValidationError::new(ValidationErrorKind::UnknownDependency, &task.name, message);
                err.suggestion = suggestion;
                return Err(err);
            }
        }
        Ok(())
    }

    fn check_cycles(&self) -> std::result::Result<(), ValidationError> {
        let Some(cycle) = self.dependency_graph().find_cycle() else {
            return Ok(());
        };
        let closing = cycle.first().cloned().unwrap_or_default();
        let mut err = ValidationError::new(
            ValidationErrorKind::CycleDetected,
            &closing,
            format!("dependency cycle: {}", cycle.join(" -> ")),
        );
        err.cycle = cycle;
        Err(err)
    }

    fn check_k8s(&self) -> std::result::Result<(), ValidationError> {
        for task in &self.tasks {
            let Some(spec) = task.own_k8s().or(self.k8s_defaults.as_ref()) else {
                continue;
            };
            if let Some((field, value, example)) = spec.invalid_quantity() {
                return Err(ValidationError::new(
                    ValidationErrorKind::InvalidK8s,
                    &task.name,
                    format!(
                        "task '{}': invalid k8s {field} format '{value}' (expected e.g. {example})",
                        task.name
                    ),
                ));
            }
        }
        Ok(())
    }
}
