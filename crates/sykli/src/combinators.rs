//! Composition combinators: `chain`, `parallel`, `matrix`.

use crate::error::Result;
use crate::gate::GateBuilder;
use crate::pipeline::Pipeline;
use crate::task::TaskBuilder;
use tracing::debug;

/// Name of a registered task or gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskRef {
    name: String,
}

impl TaskRef {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<&str> for TaskRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<&Self> for TaskRef {
    fn from(task: &Self) -> Self {
        task.clone()
    }
}

/// A named set of tasks produced by a combinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskGroup {
    name: String,
    task_names: Vec<String>,
}

impl TaskGroup {
    pub(crate) const fn new(name: String, task_names: Vec<String>) -> Self {
        Self { name, task_names }
    }

    /// Group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member task names, in order.
    #[must_use]
    pub fn task_names(&self) -> &[String] {
        &self.task_names
    }

    /// Tasks a dependent of this group waits for.
    pub fn last_tasks(&self) -> impl Iterator<Item = &str> {
        self.task_names.iter().map(String::as_str)
    }
}

/// One step of a [`Pipeline::chain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// A single task
    Task(TaskRef),
    /// Every task of a group
    Group(TaskGroup),
}

impl Stage {
    fn task_names(&self) -> Vec<String> {
        match self {
            Self::Task(task) => vec![task.name.clone()],
            Self::Group(group) => group.task_names.clone(),
        }
    }
}

impl From<TaskRef> for Stage {
    fn from(task: TaskRef) -> Self {
        Self::Task(task)
    }
}

impl From<&TaskRef> for Stage {
    fn from(task: &TaskRef) -> Self {
        Self::Task(task.clone())
    }
}

impl From<&str> for Stage {
    fn from(name: &str) -> Self {
        Self::Task(TaskRef::new(name))
    }
}

impl From<TaskBuilder<'_>> for Stage {
    fn from(builder: TaskBuilder<'_>) -> Self {
        Self::Task(builder.handle())
    }
}

impl From<GateBuilder<'_>> for Stage {
    fn from(builder: GateBuilder<'_>) -> Self {
        Self::Task(builder.handle())
    }
}

impl From<TaskGroup> for Stage {
    fn from(group: TaskGroup) -> Self {
        Self::Group(group)
    }
}

impl From<&TaskGroup> for Stage {
    fn from(group: &TaskGroup) -> Self {
        Self::Group(group.clone())
    }
}

impl Pipeline {
    /// Run stages in sequence: every task of a stage depends on every task
    /// of the stage before it.
    ///
    /// Names that do not refer to a registered task are passed through
    /// without edges. The returned group holds the tasks of the final stage.
    pub fn chain<I, S>(&mut self, stages: I) -> TaskGroup
    where
        I: IntoIterator<Item = S>,
        S: Into<Stage>,
    {
        let mut previous: Vec<String> = Vec::new();
        for stage in stages {
            let current = stage.into().task_names();
            if !previous.is_empty() {
                for name in &current {
                    if let Some(task) = self.task_data_mut(name) {
                        for dep in &previous {
                            task.add_dependency(dep);
                        }
                    }
                }
            }
            previous = current;
        }
        debug!("Chained stages ending in {:?}", previous);
        TaskGroup::new("chain".to_string(), previous)
    }

    /// Group tasks that may run concurrently. Adds no edges.
    pub fn parallel<I, T>(&self, name: &str, tasks: I) -> TaskGroup
    where
        I: IntoIterator<Item = T>,
        T: Into<TaskRef>,
    {
        let names: Vec<String> = tasks.into_iter().map(|t| t.into().name).collect();
        for unknown in names.iter().filter(|n| !self.contains_task(n)) {
            debug!("Parallel group '{}' references unregistered task '{}'", name, unknown);
        }
        TaskGroup::new(name.to_string(), names)
    }

    /// Create one task per value.
    ///
    /// `build` registers and configures the task for a value; its errors
    /// abort the whole matrix.
    pub fn matrix<I, S, F>(&mut self, name: &str, values: I, mut build: F) -> Result<TaskGroup>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&mut Self, &str) -> Result<TaskRef>,
    {
        let mut names = Vec::new();
        for value in values {
            names.push(build(self, value.as_ref())?.name);
        }
        debug!("Matrix '{}' created {} tasks", name, names.len());
        Ok(TaskGroup::new(name.to_string(), names))
    }

    /// Create one task per key-value pair, in iteration order.
    pub fn matrix_map<I, K, V, F>(
        &mut self,
        name: &str,
        entries: I,
        mut build: F,
    ) -> Result<TaskGroup>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
        F: FnMut(&mut Self, &str, &str) -> Result<TaskRef>,
    {
        let mut names = Vec::new();
        for (key, value) in entries {
            names.push(build(self, key.as_ref(), value.as_ref())?.name);
        }
        debug!("Matrix '{}' created {} tasks", name, names.len());
        Ok(TaskGroup::new(name.to_string(), names))
    }
}
