//! Approval gates.
//!
//! A gate is a task without a command that blocks its dependents until the
//! engine receives approval through the configured strategy.

use crate::combinators::{TaskGroup, TaskRef};
use crate::condition::Condition;
use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::task::{EnumArg, TaskData};
use sykli_ir::{Gate, GateStrategy};

/// Seconds a gate waits for approval unless configured otherwise.
pub const DEFAULT_GATE_TIMEOUT: u64 = 3600;

pub(crate) fn default_gate() -> Gate {
    Gate {
        strategy: GateStrategy::Prompt,
        timeout: DEFAULT_GATE_TIMEOUT,
        message: None,
        env_var: None,
        file_path: None,
    }
}

/// Fluent handle for configuring a gate registered with [`Pipeline::gate`].
pub struct GateBuilder<'a> {
    pipeline: &'a mut Pipeline,
    index: usize,
}

impl<'a> GateBuilder<'a> {
    pub(crate) fn new(pipeline: &'a mut Pipeline, index: usize) -> Self {
        Self { pipeline, index }
    }

    fn data(&mut self) -> &mut TaskData {
        &mut self.pipeline.tasks[self.index]
    }

    fn gate(&mut self) -> &mut Gate {
        self.data().gate.get_or_insert_with(default_gate)
    }

    /// Name of the gate.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.pipeline.tasks[self.index].name
    }

    /// A lightweight reference usable after the builder is dropped.
    #[must_use]
    pub fn handle(&self) -> TaskRef {
        TaskRef::new(self.name())
    }

    /// How approval is obtained.
    pub fn strategy(mut self, strategy: impl EnumArg<GateStrategy>) -> Result<Self> {
        let strategy = strategy.into_enum()?;
        self.gate().strategy = strategy;
        Ok(self)
    }

    /// Message shown to the approver.
    pub fn message(mut self, message: &str) -> Self {
        self.gate().message = Some(message.to_string());
        self
    }

    /// Seconds to wait before the gate fails.
    pub fn timeout(mut self, seconds: u64) -> Result<Self> {
        if seconds == 0 {
            return Err(Error::InvalidTimeout {
                task: self.name().to_string(),
                field: "gate timeout",
            });
        }
        self.gate().timeout = seconds;
        Ok(self)
    }

    /// Environment variable checked by the `env` strategy.
    pub fn env_var(mut self, var: &str) -> Self {
        self.gate().env_var = Some(var.to_string());
        self
    }

    /// File checked by the `file` strategy.
    pub fn file_path(mut self, path: &str) -> Self {
        self.gate().file_path = Some(path.to_string());
        self
    }

    /// Wait for the named tasks first.
    pub fn after<I, S>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let data = self.data();
        for task in tasks {
            data.add_dependency(task.as_ref());
        }
        self
    }

    /// Wait for the last tasks of each group first.
    pub fn after_group<'g, I>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = &'g TaskGroup>,
    {
        let data = self.data();
        for group in groups {
            for task in group.last_tasks() {
                data.add_dependency(task);
            }
        }
        self
    }

    /// Only gate when the condition holds.
    pub fn when(mut self, condition: impl Into<Condition>) -> Self {
        self.data().when = Some(condition.into());
        self
    }
}

impl From<GateBuilder<'_>> for TaskRef {
    fn from(builder: GateBuilder<'_>) -> Self {
        builder.handle()
    }
}

impl From<&GateBuilder<'_>> for TaskRef {
    fn from(builder: &GateBuilder<'_>) -> Self {
        builder.handle()
    }
}
