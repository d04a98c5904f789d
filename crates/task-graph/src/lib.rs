//! Dependency graph algorithms for sykli pipelines.
//!
//! This crate provides a directed graph over task definitions, built on
//! petgraph, that the pipeline SDK uses to search for dependency cycles and
//! to compute execution order.
//!
//! # Key Types
//!
//! - [`TaskGraph`]: The graph structure for registering tasks and wiring their dependencies
//! - [`TaskNodeData`]: Trait that task types must implement to be stored in the graph
//! - [`GraphNode`]: A node in the graph containing the task name and data
//!
//! # Example
//!
//! ```ignore
//! use sykli_task_graph::{TaskGraph, TaskNodeData};
//!
//! struct Step {
//!     depends_on: Vec<String>,
//! }
//!
//! impl TaskNodeData for Step {
//!     fn dependency_names(&self) -> impl Iterator<Item = &str> {
//!         self.depends_on.iter().map(String::as_str)
//!     }
//! }
//!
//! let mut graph = TaskGraph::new();
//! graph.add_task("lint", Step { depends_on: vec![] })?;
//! graph.add_task("test", Step { depends_on: vec!["lint".to_string()] })?;
//! assert!(graph.find_cycle().is_none());
//! graph.add_dependency_edges()?;
//! let levels = graph.get_parallel_groups()?;
//! ```

mod cycle;
mod error;
mod graph;
mod traversal;

pub use error::{Error, Result};
pub use graph::{GraphNode, TaskGraph};
pub use traversal::{ParallelGroups, TopologicalOrder};

/// Trait for task data that can be stored in the task graph.
///
/// Implement this trait for your task type to enable it to be stored
/// in a [`TaskGraph`] and participate in dependency resolution.
pub trait TaskNodeData: Clone {
    /// Returns the names of tasks this task depends on, in declaration order.
    fn dependency_names(&self) -> impl Iterator<Item = &str>;
}
