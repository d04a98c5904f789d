//! Human-readable pipeline explanation.

use crate::condition::Evaluation;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::task::TaskData;
use std::fmt::Write as _;
use std::io;

/// Runtime values used to predict which conditional tasks would run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplainContext {
    /// Current branch
    pub branch: String,
    /// Current tag, empty if none
    pub tag: String,
    /// Triggering event
    pub event: String,
    /// Whether the run happens under CI
    pub ci: bool,
}

impl ExplainContext {
    /// Context for a branch build.
    pub fn for_branch(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            ..Self::default()
        }
    }
}

impl Pipeline {
    /// Validate and describe the pipeline, one line per task.
    ///
    /// With a context, conditional tasks are marked `RUN` or `SKIP` when the
    /// condition is simple enough to evaluate.
    pub fn explain(&self, ctx: Option<&ExplainContext>) -> Result<String> {
        self.validate()?;
        let mut out = format!("Pipeline: {} tasks\n", self.tasks.len());
        for task in &self.tasks {
            let _ = writeln!(out, "{}", describe(task, ctx));
        }
        Ok(out)
    }

    /// Validate and write the explanation to `writer`.
    pub fn explain_to<W: io::Write>(&self, mut writer: W, ctx: Option<&ExplainContext>) -> Result<()> {
        let text = self.explain(ctx)?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }
}

fn describe(task: &TaskData, ctx: Option<&ExplainContext>) -> String {
    let mut line = format!("  {}: ", task.name);
    match &task.gate {
        Some(gate) => {
            let _ = write!(line, "gate ({})", gate.strategy);
        }
        None => line.push_str(task.command.as_deref().unwrap_or_default()),
    }
    if !task.depends_on.is_empty() {
        let _ = write!(line, " (after: {})", task.depends_on.join(", "));
    }
    if let Some(condition) = &task.when {
        let verdict = ctx.map_or(Evaluation::Unknown, |ctx| condition.evaluate(ctx));
        let label = match verdict {
            Evaluation::Run => "RUN",
            Evaluation::Skip => "SKIP",
            Evaluation::Unknown => "when",
        };
        let _ = write!(line, " [{label}: {condition}]");
    }
    line
}
