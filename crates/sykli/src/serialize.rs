//! Projection of a pipeline onto the IR document.

use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::task::TaskData;
use indexmap::IndexMap;
use std::io::Write;
use sykli_ir::{AiHooks, IrVersion, PipelineDocument, Semantic, Task};
use tracing::debug;

impl Pipeline {
    /// Validate and build the IR document.
    pub fn to_document(&self) -> Result<PipelineDocument> {
        self.validate()?;
        Ok(self.build_document())
    }

    /// Validate and encode the IR as compact JSON.
    pub fn to_json(&self) -> Result<String> {
        let document = self.to_document()?;
        Ok(serde_json::to_string(&document)?)
    }

    /// Validate and write the compact JSON encoding to `writer`.
    ///
    /// Nothing is written if validation fails.
    pub fn emit_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let document = self.to_document()?;
        serde_json::to_writer(&mut writer, &document)?;
        writer.flush()?;
        debug!("Emitted IR version {}", document.version.as_str());
        Ok(())
    }

    /// Version 2 once any resource, container or mount is in play.
    fn version(&self) -> IrVersion {
        let uses_containers = self
            .tasks
            .iter()
            .any(|t| t.container.is_some() || !t.mounts.is_empty());
        if !self.resources.is_empty() || uses_containers {
            IrVersion::V2
        } else {
            IrVersion::V1
        }
    }

    fn build_document(&self) -> PipelineDocument {
        let version = self.version();
        let resources = match version {
            IrVersion::V2 => self.resources.to_ir(),
            IrVersion::V1 => IndexMap::new(),
        };
        PipelineDocument {
            version,
            resources,
            tasks: self.tasks.iter().map(|t| self.project(t)).collect(),
        }
    }

    fn project(&self, task: &TaskData) -> Task {
        let k8s = match task.own_k8s() {
            Some(own) => own.to_ir(&task.k8s_raw),
            None if !task.k8s_raw.is_empty() => {
                crate::K8sOptions::default().to_ir(&task.k8s_raw)
            }
            None => self.k8s_defaults.as_ref().and_then(|d| d.defaults_to_ir()),
        };

        let semantic = Semantic {
            covers: task.covers.clone(),
            intent: task.intent.clone().filter(|s| !s.is_empty()),
            criticality: task.criticality,
        };
        let ai_hooks = AiHooks {
            on_fail: task.on_fail,
            select: task.select,
        };

        Task {
            name: task.name.clone(),
            command: task.command.clone(),
            container: task.container.clone(),
            workdir: task.workdir.clone().filter(|s| !s.is_empty()),
            env: task.env.clone(),
            mounts: task.mounts.clone(),
            inputs: task.inputs.clone(),
            task_inputs: task.task_inputs.clone(),
            outputs: merge_outputs(&task.outputs, &task.positional_outputs),
            depends_on: task.depends_on.clone(),
            when: task
                .when
                .as_ref()
                .map(ToString::to_string)
                .filter(|s| !s.is_empty()),
            secrets: task.secrets.clone(),
            secret_refs: task.secret_refs.iter().map(|r| r.to_ir()).collect(),
            matrix: task.matrix.clone(),
            services: task.services.clone(),
            retry: task.retry,
            timeout: task.timeout,
            target: task.target.clone().filter(|s| !s.is_empty()),
            k8s,
            requires: task.requires.clone(),
            provides: task.provides.clone(),
            needs: task.needs.clone(),
            semantic: (semantic != Semantic::default()).then_some(semantic),
            ai_hooks: (ai_hooks != AiHooks::default()).then_some(ai_hooks),
            gate: task.gate.clone(),
        }
    }
}

/// Merge named and positional outputs into one map.
///
/// Positional outputs are keyed `output_<i>`. A key already taken gets
/// `_<i>` appended until it is free.
pub(crate) fn merge_outputs(
    named: &IndexMap<String, String>,
    positional: &[String],
) -> IndexMap<String, String> {
    let mut merged = named.clone();
    for (idx, path) in positional.iter().enumerate() {
        let mut key = format!("output_{idx}");
        while merged.contains_key(&key) {
            key.push_str(&format!("_{idx}"));
        }
        merged.insert(key, path.clone());
    }
    merged
}
