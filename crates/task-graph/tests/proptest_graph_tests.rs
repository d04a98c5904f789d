//! Property-based tests for task graph invariants.
//!
//! - Graphs whose tasks only depend on earlier tasks never report a cycle
//! - A ring of any length is reported, and the reported path is a real cycle
//! - Execution levels place every dependency in an earlier level

use proptest::prelude::*;
use std::collections::HashMap;
use sykli_task_graph::{TaskGraph, TaskNodeData};

#[derive(Clone, Debug)]
struct PropTask {
    deps: Vec<String>,
}

impl TaskNodeData for PropTask {
    fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.deps.iter().map(String::as_str)
    }
}

/// Generate `(name, deps)` pairs where each task depends only on earlier tasks.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    (1..=max_tasks).prop_flat_map(|task_count| {
        let names: Vec<String> = (0..task_count).map(|i| format!("task_{i}")).collect();
        let dep_strategies: Vec<_> = (0..task_count)
            .map(|i| {
                if i == 0 {
                    Just(Vec::new()).boxed()
                } else {
                    proptest::sample::subsequence(names[..i].to_vec(), 0..=i.min(3)).boxed()
                }
            })
            .collect();
        let names_clone = names.clone();
        dep_strategies.prop_map(move |all_deps| {
            names_clone.iter().cloned().zip(all_deps).collect::<Vec<_>>()
        })
    })
}

fn build_graph(tasks: &[(String, Vec<String>)]) -> TaskGraph<PropTask> {
    let mut graph = TaskGraph::new();
    for (name, deps) in tasks {
        graph
            .add_task(name, PropTask { deps: deps.clone() })
            .expect("add should succeed");
    }
    graph
}

proptest! {
    #[test]
    fn dags_have_no_cycles(tasks in dag_strategy(20)) {
        let graph = build_graph(&tasks);
        prop_assert_eq!(graph.find_cycle(), None);
    }

    #[test]
    fn rings_are_reported(len in 1_usize..12, offset in 0_usize..12) {
        // task_i depends on task_{i+1}, the last one closes the ring
        let names: Vec<String> = (0..len).map(|i| format!("r{i}")).collect();
        let mut tasks: Vec<(String, Vec<String>)> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), vec![names[(i + 1) % len].clone()]))
            .collect();
        tasks.rotate_left(offset % len);

        let graph = build_graph(&tasks);
        let cycle = graph.find_cycle().expect("ring must be reported");

        prop_assert_eq!(cycle.len(), len + 1);
        prop_assert_eq!(cycle.first(), cycle.last());

        let deps: HashMap<&str, &Vec<String>> =
            tasks.iter().map(|(n, d)| (n.as_str(), d)).collect();
        for pair in cycle.windows(2) {
            prop_assert!(deps[pair[0].as_str()].contains(&pair[1]));
        }
    }

    #[test]
    fn parallel_groups_respect_dependency_order(tasks in dag_strategy(15)) {
        let mut graph = build_graph(&tasks);
        graph.add_dependency_edges().expect("edges should wire");
        let groups = graph.get_parallel_groups().expect("groups should compute");

        let mut level: HashMap<String, usize> = HashMap::new();
        for (idx, group) in groups.iter().enumerate() {
            for node in group {
                prop_assert!(level.insert(node.name.clone(), idx).is_none());
            }
        }
        prop_assert_eq!(level.len(), tasks.len());

        for (name, deps) in &tasks {
            for dep in deps {
                prop_assert!(level[dep] < level[name]);
            }
        }
    }

    #[test]
    fn parallel_groups_are_deterministic(tasks in dag_strategy(10)) {
        let mut first = build_graph(&tasks);
        let mut second = build_graph(&tasks);
        first.add_dependency_edges().expect("edges should wire");
        second.add_dependency_edges().expect("edges should wire");

        let names = |graph: &TaskGraph<PropTask>| -> Vec<Vec<String>> {
            graph
                .get_parallel_groups()
                .expect("groups should compute")
                .iter()
                .map(|g| g.iter().map(|n| n.name.clone()).collect())
                .collect()
        };
        prop_assert_eq!(names(&first), names(&second));
    }
}
