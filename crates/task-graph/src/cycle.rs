//! Cycle search over the dependency relation.
//!
//! The search follows `dependency_names()` directly rather than the wired
//! edges, so it can run before [`TaskGraph::add_dependency_edges`] and
//! simply ignores dependencies on unregistered tasks.

use crate::{TaskGraph, TaskNodeData};
use petgraph::graph::NodeIndex;

/// Three-color DFS marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not visited yet.
    White,
    /// On the current search path.
    Gray,
    /// Fully explored.
    Black,
}

impl<T: TaskNodeData> TaskGraph<T> {
    /// Find the first dependency cycle in registration order.
    ///
    /// Returns the path from the first occurrence of the revisited task
    /// through the closing edge, so the first and last entries are equal.
    /// A task depending on itself yields `[task, task]`.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let adjacency: Vec<Vec<NodeIndex>> = self
            .graph
            .node_indices()
            .map(|idx| {
                self.graph[idx]
                    .task
                    .dependency_names()
                    .filter_map(|dep| self.name_to_node.get(dep).copied())
                    .collect()
            })
            .collect();

        let mut color = vec![Color::White; self.graph.node_count()];
        let mut path: Vec<NodeIndex> = Vec::new();

        for root in self.graph.node_indices() {
            if color[root.index()] != Color::White {
                continue;
            }

            // Explicit stack of (node, next dependency position) so deep
            // chains don't exhaust the call stack.
            let mut stack: Vec<(NodeIndex, usize)> = vec![(root, 0)];
            color[root.index()] = Color::Gray;
            path.push(root);

            while let Some(frame) = stack.last_mut() {
                let (node, pos) = *frame;

                let Some(&dep) = adjacency[node.index()].get(pos) else {
                    color[node.index()] = Color::Black;
                    path.pop();
                    stack.pop();
                    continue;
                };
                frame.1 += 1;

                match color[dep.index()] {
                    Color::Gray => {
                        let start = path.iter().position(|&n| n == dep).unwrap_or(0);
                        let mut cycle: Vec<String> = path[start..]
                            .iter()
                            .map(|&n| self.graph[n].name.clone())
                            .collect();
                        cycle.push(self.graph[dep].name.clone());
                        return Some(cycle);
                    }
                    Color::White => {
                        color[dep.index()] = Color::Gray;
                        path.push(dep);
                        stack.push((dep, 0));
                    }
                    Color::Black => {}
                }
            }
        }

        None
    }
}
