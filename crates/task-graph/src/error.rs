//! Error types for task graph operations.

use thiserror::Error;

/// Result type for task graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during task graph operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// A dependency cycle was detected in the graph.
    #[error("Cycle detected in task graph: {}", cycle.join(" -> "))]
    CycleDetected {
        /// The cycle path, starting and ending with the same task.
        cycle: Vec<String>,
    },

    /// Tasks depend on other tasks that don't exist.
    #[error("Missing dependencies: {}", format_missing(missing))]
    MissingDependencies {
        /// List of (task, missing_dependency) pairs in declaration order.
        missing: Vec<(String, String)>,
    },

    /// Failed to perform topological sort.
    #[error("Failed to sort tasks topologically: {reason}")]
    TopologicalSortFailed {
        /// Reason for the failure.
        reason: String,
    },
}

fn format_missing(missing: &[(String, String)]) -> String {
    missing
        .iter()
        .map(|(task, dep)| format!("Task '{task}' depends on missing task '{dep}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
