//! The pipeline aggregate: owns tasks, resources and templates.

use crate::error::{Error, Result};
use crate::gate::{GateBuilder, default_gate};
use crate::k8s::K8sOptions;
use crate::resource::{CacheVolume, DIRECTORY_ID_PREFIX, Directory, ResourceRegistry};
use crate::task::{TaskBuilder, TaskData};
use crate::template::{TemplateBuilder, TemplateData};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

/// A pipeline under construction.
///
/// Tasks and gates share one namespace and keep declaration order. Builder
/// errors abort only the offending call; the pipeline stays usable and the
/// task can be reopened with [`Pipeline::task_mut`] or [`Pipeline::gate_mut`].
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub(crate) tasks: Vec<TaskData>,
    pub(crate) task_index: HashMap<String, usize>,
    pub(crate) resources: ResourceRegistry,
    pub(crate) templates: IndexMap<String, TemplateData>,
    pub(crate) k8s_defaults: Option<K8sOptions>,
}

impl Pipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty pipeline whose tasks fall back to `defaults` for
    /// Kubernetes resource requests.
    #[must_use]
    pub fn with_k8s_defaults(defaults: K8sOptions) -> Self {
        Self {
            k8s_defaults: Some(defaults),
            ..Self::default()
        }
    }

    /// Pipeline-level Kubernetes defaults, if any.
    #[must_use]
    pub const fn k8s_defaults(&self) -> Option<&K8sOptions> {
        self.k8s_defaults.as_ref()
    }

    /// Register a task and return its builder.
    pub fn task(&mut self, name: &str) -> Result<TaskBuilder<'_>> {
        let index = self.register(name, "task name")?;
        debug!("Registered task '{}'", name);
        Ok(TaskBuilder::new(self, index))
    }

    /// Register an approval gate and return its builder.
    pub fn gate(&mut self, name: &str) -> Result<GateBuilder<'_>> {
        let index = self.register(name, "gate name")?;
        self.tasks[index].gate = Some(default_gate());
        debug!("Registered gate '{}'", name);
        Ok(GateBuilder::new(self, index))
    }

    /// Reopen a registered task, e.g. after a setter rejected its input.
    ///
    /// Returns `None` for unknown names and for gates.
    pub fn task_mut(&mut self, name: &str) -> Option<TaskBuilder<'_>> {
        let index = *self.task_index.get(name)?;
        if self.tasks[index].is_gate() {
            return None;
        }
        Some(TaskBuilder::new(self, index))
    }

    /// Reopen a registered gate. Returns `None` for unknown names and tasks.
    pub fn gate_mut(&mut self, name: &str) -> Option<GateBuilder<'_>> {
        let index = *self.task_index.get(name)?;
        if !self.tasks[index].is_gate() {
            return None;
        }
        Some(GateBuilder::new(self, index))
    }

    /// Register a template and return its builder.
    pub fn template(&mut self, name: &str) -> Result<TemplateBuilder<'_>> {
        if name.is_empty() {
            return Err(Error::empty_name("template name"));
        }
        if self.templates.contains_key(name) {
            return Err(Error::Duplicate {
                kind: "template",
                name: name.to_string(),
            });
        }
        self.templates
            .insert(name.to_string(), TemplateData::default());
        debug!("Registered template '{}'", name);
        Ok(TemplateBuilder::new(self, name.to_string()))
    }

    /// A source directory. Repeated calls return the same resource.
    pub fn dir(&mut self, path: &str) -> Result<Directory> {
        self.dir_with_globs::<_, String>(path, [])
    }

    /// A source directory filtered by glob patterns.
    ///
    /// Globs given for an already registered path are appended to its set.
    pub fn dir_with_globs<I, S>(&mut self, path: &str, globs: I) -> Result<Directory>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if path.trim().is_empty() {
            return Err(Error::empty_name("directory path"));
        }
        let globs: Vec<String> = globs.into_iter().map(Into::into).collect();
        Ok(self.resources.directory(path, &globs))
    }

    /// A named cache volume. Repeated calls return the same resource.
    ///
    /// Names starting with `src:` are reserved for directory ids.
    pub fn cache(&mut self, name: &str) -> Result<CacheVolume> {
        if name.trim().is_empty() {
            return Err(Error::empty_name("cache name"));
        }
        if name.starts_with(DIRECTORY_ID_PREFIX) {
            return Err(Error::ReservedCacheName {
                name: name.to_string(),
                prefix: DIRECTORY_ID_PREFIX,
            });
        }
        Ok(self.resources.cache(name))
    }

    /// True if a task or gate with this name exists.
    #[must_use]
    pub fn contains_task(&self, name: &str) -> bool {
        self.task_index.contains_key(name)
    }

    /// Task and gate names in declaration order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.name.as_str())
    }

    /// Number of tasks and gates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub(crate) fn task_data_mut(&mut self, name: &str) -> Option<&mut TaskData> {
        let index = *self.task_index.get(name)?;
        self.tasks.get_mut(index)
    }

    fn register(&mut self, name: &str, kind: &'static str) -> Result<usize> {
        if name.is_empty() {
            return Err(Error::empty_name(kind));
        }
        if self.contains_task(name) {
            return Err(Error::Duplicate {
                kind: "task",
                name: name.to_string(),
            });
        }
        let index = self.tasks.len();
        self.tasks.push(TaskData::new(name));
        self.task_index.insert(name.to_string(), index);
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_names_are_unique_across_gates() {
        let mut p = Pipeline::new();
        p.task("deploy").unwrap();
        assert!(matches!(
            p.gate("deploy").err().unwrap(),
            Error::Duplicate { kind: "task", .. }
        ));
        p.gate("approve").unwrap();
        assert!(matches!(
            p.task("approve").err().unwrap(),
            Error::Duplicate { .. }
        ));
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn test_empty_names_rejected() {
        let mut p = Pipeline::new();
        assert_eq!(
            p.task("").err().unwrap().to_string(),
            "task name cannot be empty"
        );
        assert_eq!(
            p.gate("").err().unwrap().to_string(),
            "gate name cannot be empty"
        );
        assert_eq!(
            p.template("").err().unwrap().to_string(),
            "template name cannot be empty"
        );
        assert!(p.dir("  ").is_err());
        assert!(p.cache("").is_err());
        assert!(p.is_empty());
    }

    #[test]
    fn test_duplicate_template() {
        let mut p = Pipeline::new();
        p.template("node").unwrap();
        assert_eq!(
            p.template("node").err().unwrap().to_string(),
            "template 'node' already exists"
        );
    }

    #[test]
    fn test_pipeline_usable_after_error() {
        let mut p = Pipeline::new();
        p.task("a").unwrap().run("echo a").unwrap();
        assert!(p.task("a").is_err());
        p.task("b").unwrap().run("echo b").unwrap();
        let names: Vec<_> = p.task_names().collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_task_recovers_after_rejected_setter() {
        let mut p = Pipeline::new();
        let err = p.task("build").unwrap().run("").err().unwrap();
        assert!(matches!(err, Error::EmptyCommand { .. }));
        assert!(matches!(
            p.task("build").err().unwrap(),
            Error::Duplicate { .. }
        ));

        p.task_mut("build").unwrap().run("cargo build").unwrap();
        assert!(p.validate().is_ok());
        assert_eq!(p.tasks[0].command.as_deref(), Some("cargo build"));
    }

    #[test]
    fn test_gate_recovers_after_rejected_setter() {
        let mut p = Pipeline::new();
        assert!(p.gate("approve").unwrap().timeout(0).is_err());
        p.gate_mut("approve").unwrap().timeout(60).unwrap();
        assert_eq!(p.tasks[0].gate.as_ref().unwrap().timeout, 60);
    }

    #[test]
    fn test_reopen_respects_kind() {
        let mut p = Pipeline::new();
        p.task("t").unwrap().run("x").unwrap();
        p.gate("g").unwrap();
        assert!(p.task_mut("g").is_none());
        assert!(p.gate_mut("t").is_none());
        assert!(p.task_mut("missing").is_none());
    }

    #[test]
    fn test_resource_dedup() {
        let mut p = Pipeline::new();
        let a = p.dir(".").unwrap();
        let b = p.dir(".").unwrap();
        assert_eq!(a, b);
        let c1 = p.cache("cargo").unwrap();
        let c2 = p.cache("cargo").unwrap();
        assert_eq!(c1.id(), c2.id());
        p.dir_with_globs("src", ["*.rs"]).unwrap();
        assert_eq!(p.resources.to_ir().len(), 3);
    }

    #[test]
    fn test_cache_cannot_shadow_directory_id() {
        let mut p = Pipeline::new();
        let dir = p.dir("x").unwrap();
        let err = p.cache(&dir.id()).err().unwrap();
        assert!(matches!(err, Error::ReservedCacheName { .. }));
        assert_eq!(err.to_string(), "cache name 'src:x' cannot start with 'src:'");

        let cache = p.cache("x").unwrap();
        assert_ne!(cache.id(), dir.id());
        let resources = p.resources.to_ir();
        assert_eq!(resources.len(), 2);
        assert!(matches!(
            resources["src:x"],
            sykli_ir::Resource::Directory { .. }
        ));
        assert!(matches!(resources["x"], sykli_ir::Resource::Cache { .. }));
    }
}
