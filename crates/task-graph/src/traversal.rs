//! Traversal result types for task graphs.

use crate::GraphNode;

/// A topologically sorted sequence of task nodes.
///
/// All dependencies come before the tasks that depend on them.
pub type TopologicalOrder<T> = Vec<GraphNode<T>>;

/// Groups of tasks that can execute in parallel.
///
/// Each inner vector holds tasks with no dependencies on each other, in
/// registration order. All tasks in group N must complete before tasks in
/// group N+1 can start.
pub type ParallelGroups<T> = Vec<Vec<GraphNode<T>>>;
