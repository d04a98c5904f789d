//! Task graph builder using petgraph.
//!
//! This module builds directed graphs from task definitions to check
//! dependencies and determine execution order.

use crate::{Error, ParallelGroups, Result, TaskNodeData, TopologicalOrder};
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::IntoNodeReferences;
use std::collections::HashMap;
use tracing::debug;

/// A node in the task graph.
#[derive(Debug, Clone)]
pub struct GraphNode<T> {
    /// Name of the task.
    pub name: String,
    /// The task data.
    pub task: T,
}

/// Task graph for dependency checking and execution ordering.
///
/// Node indices follow registration order, so every traversal that walks
/// `node_indices()` visits tasks in the order they were declared.
pub struct TaskGraph<T: TaskNodeData> {
    /// The directed graph of tasks. Edges point from a dependency to its dependent.
    pub(crate) graph: DiGraph<GraphNode<T>, ()>,
    /// Map from task names to node indices.
    pub(crate) name_to_node: HashMap<String, NodeIndex>,
}

impl<T: TaskNodeData> TaskGraph<T> {
    /// Create a new empty task graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            name_to_node: HashMap::new(),
        }
    }

    /// Add a single task to the graph.
    ///
    /// If a task with the same name already exists, returns the existing node index.
    ///
    /// # Errors
    ///
    /// Currently infallible, but returns `Result` for API consistency.
    pub fn add_task(&mut self, name: &str, task: T) -> Result<NodeIndex> {
        if let Some(&node) = self.name_to_node.get(name) {
            return Ok(node);
        }

        let node = GraphNode {
            name: name.to_string(),
            task,
        };

        let node_index = self.graph.add_node(node);
        self.name_to_node.insert(name.to_string(), node_index);
        debug!("Added task node '{}'", name);

        Ok(node_index)
    }

    /// Get a reference to a task node by name.
    #[must_use]
    pub fn get_node_by_name(&self, name: &str) -> Option<&GraphNode<T>> {
        self.name_to_node
            .get(name)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    /// Add dependency edges after all tasks have been added.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingDependencies`] listing every dependency that
    /// names an unregistered task, in declaration order. No edge is added
    /// in that case.
    pub fn add_dependency_edges(&mut self) -> Result<()> {
        let mut missing_deps = Vec::new();
        let mut edges_to_add = Vec::new();

        for (node_index, node) in self.graph.node_references() {
            for dep_name in node.task.dependency_names() {
                if let Some(&dep_node_index) = self.name_to_node.get(dep_name) {
                    edges_to_add.push((dep_node_index, node_index));
                } else {
                    missing_deps.push((node.name.clone(), dep_name.to_string()));
                }
            }
        }

        if !missing_deps.is_empty() {
            return Err(Error::MissingDependencies {
                missing: missing_deps,
            });
        }

        for (from, to) in edges_to_add {
            self.graph.update_edge(from, to, ());
        }

        Ok(())
    }

    /// Check if the graph has cycles.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Get topologically sorted list of tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn topological_sort(&self) -> Result<TopologicalOrder<T>> {
        Ok(self
            .sorted_indices()?
            .into_iter()
            .map(|idx| self.graph[idx].clone())
            .collect())
    }

    fn sorted_indices(&self) -> Result<Vec<NodeIndex>> {
        if let Some(cycle) = self.find_cycle() {
            return Err(Error::CycleDetected { cycle });
        }

        toposort(&self.graph, None).map_err(|_| Error::TopologicalSortFailed {
            reason: "petgraph toposort failed".to_string(),
        })
    }

    /// Get all tasks that can run in parallel (no dependencies between them).
    ///
    /// Returns a vector of parallel groups ordered by dependency level. Within
    /// a group, tasks keep their registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn get_parallel_groups(&self) -> Result<ParallelGroups<T>> {
        let sorted = self.sorted_indices()?;

        let mut levels: HashMap<NodeIndex, usize> = HashMap::new();
        let mut groups: Vec<Vec<NodeIndex>> = Vec::new();

        for idx in sorted {
            // Incoming edges come from the dependencies of this task
            let level = self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .filter_map(|dep| levels.get(&dep))
                .map(|dep_level| dep_level + 1)
                .max()
                .unwrap_or(0);

            if level >= groups.len() {
                groups.resize_with(level + 1, Vec::new);
            }
            groups[level].push(idx);
            levels.insert(idx, level);
        }

        Ok(groups
            .into_iter()
            .map(|mut group| {
                group.sort_unstable();
                group
                    .into_iter()
                    .map(|idx| self.graph[idx].clone())
                    .collect()
            })
            .collect())
    }

    /// Get the number of tasks in the graph.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Check if a task exists in the graph.
    #[must_use]
    pub fn contains_task(&self, name: &str) -> bool {
        self.name_to_node.contains_key(name)
    }

    /// Iterate over all nodes in registration order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (NodeIndex, &GraphNode<T>)> {
        self.graph.node_references()
    }
}

impl<T: TaskNodeData> Default for TaskGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}
