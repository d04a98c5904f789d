//! Task definitions and the fluent task builder.

use crate::combinators::{TaskGroup, TaskRef};
use crate::condition::Condition;
use crate::error::{Error, Result};
use crate::k8s::K8sOptions;
use crate::pipeline::Pipeline;
use crate::resource::{CWD, CWD_MOUNT_PATH, CacheVolume, Directory};
use indexmap::IndexMap;
use sykli_ir::{
    Capability, Criticality, Gate, GateStrategy, Mount, OnFailAction, SecretSource, SelectMode,
    Service, TaskInput,
};
use sykli_task_graph::TaskNodeData;
use tracing::debug;

/// A value for a closed-enumeration setter: the typed value or its wire name.
pub trait EnumArg<T> {
    /// Resolve to the enumeration value.
    fn into_enum(self) -> Result<T>;
}

macro_rules! enum_arg {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl EnumArg<$ty> for $ty {
                fn into_enum(self) -> Result<$ty> {
                    Ok(self)
                }
            }

            impl EnumArg<$ty> for &str {
                fn into_enum(self) -> Result<$ty> {
                    self.parse::<$ty>().map_err(Error::from)
                }
            }
        )+
    };
}

enum_arg!(Criticality, OnFailAction, SelectMode, GateStrategy);

/// A typed secret reference with an explicit source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretRef {
    name: String,
    source: SecretSource,
    key: String,
}

impl SecretRef {
    /// Reference a secret read from an environment variable.
    pub fn from_env(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(name, SecretSource::Env, key)
    }

    /// Reference a secret read from a file.
    pub fn from_file(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(name, SecretSource::File, key)
    }

    /// Reference a secret read from a Vault path.
    pub fn from_vault(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(name, SecretSource::Vault, key)
    }

    /// Reference a secret from an explicit source.
    pub fn new(name: impl Into<String>, source: SecretSource, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source,
            key: key.into(),
        }
    }

    /// Secret name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn to_ir(&self) -> sykli_ir::SecretRef {
        sykli_ir::SecretRef {
            name: self.name.clone(),
            source: self.source,
            key: self.key.clone(),
        }
    }
}

/// Stored configuration of one task or gate.
#[derive(Debug, Clone, Default)]
pub(crate) struct TaskData {
    pub(crate) name: String,
    pub(crate) command: Option<String>,
    pub(crate) container: Option<String>,
    pub(crate) workdir: Option<String>,
    pub(crate) env: IndexMap<String, String>,
    pub(crate) mounts: Vec<Mount>,
    pub(crate) inputs: Vec<String>,
    pub(crate) task_inputs: Vec<TaskInput>,
    pub(crate) outputs: IndexMap<String, String>,
    pub(crate) positional_outputs: Vec<String>,
    pub(crate) depends_on: Vec<String>,
    pub(crate) when: Option<Condition>,
    pub(crate) secrets: Vec<String>,
    pub(crate) secret_refs: Vec<SecretRef>,
    pub(crate) matrix: IndexMap<String, Vec<String>>,
    pub(crate) services: Vec<Service>,
    pub(crate) retry: u32,
    pub(crate) timeout: u64,
    pub(crate) target: Option<String>,
    pub(crate) k8s: Option<K8sOptions>,
    pub(crate) k8s_raw: String,
    pub(crate) requires: Vec<String>,
    pub(crate) provides: Vec<Capability>,
    pub(crate) needs: Vec<String>,
    pub(crate) covers: Vec<String>,
    pub(crate) intent: Option<String>,
    pub(crate) criticality: Option<Criticality>,
    pub(crate) on_fail: Option<OnFailAction>,
    pub(crate) select: Option<SelectMode>,
    pub(crate) gate: Option<Gate>,
}

impl TaskData {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn is_gate(&self) -> bool {
        self.gate.is_some()
    }

    pub(crate) fn owner(&self) -> String {
        format!("task '{}'", self.name)
    }

    /// Append a dependency, ignoring empty names and duplicates.
    pub(crate) fn add_dependency(&mut self, dep: &str) {
        if !dep.is_empty() && !self.depends_on.iter().any(|d| d == dep) {
            self.depends_on.push(dep.to_string());
        }
    }

    /// The task's own quantity spec, unless it sets nothing at all.
    pub(crate) fn own_k8s(&self) -> Option<&K8sOptions> {
        self.k8s.as_ref().filter(|k8s| !k8s.is_empty())
    }
}

/// Borrowed view of a task's dependency list, stored in the task graph.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DependencyView<'a> {
    pub(crate) depends_on: &'a [String],
}

impl TaskNodeData for DependencyView<'_> {
    fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.depends_on.iter().map(String::as_str)
    }
}

pub(crate) fn check_mount_path(owner: impl FnOnce() -> String, path: &str) -> Result<()> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(Error::RelativeMountPath {
            owner: owner(),
            path: path.to_string(),
        })
    }
}

/// Fluent handle for configuring a task registered with [`Pipeline::task`].
///
/// Setters consume and return the builder; fallible setters return
/// `Result<Self>` and leave the task untouched on error. A builder dropped
/// by an error can be reopened with [`Pipeline::task_mut`].
pub struct TaskBuilder<'a> {
    pipeline: &'a mut Pipeline,
    index: usize,
}

impl<'a> TaskBuilder<'a> {
    pub(crate) fn new(pipeline: &'a mut Pipeline, index: usize) -> Self {
        Self { pipeline, index }
    }

    fn data(&mut self) -> &mut TaskData {
        &mut self.pipeline.tasks[self.index]
    }

    fn task_name(&self) -> String {
        self.pipeline.tasks[self.index].name.clone()
    }

    /// Name of the task.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.pipeline.tasks[self.index].name
    }

    /// A lightweight reference usable after the builder is dropped.
    #[must_use]
    pub fn handle(&self) -> TaskRef {
        TaskRef::new(self.name())
    }

    // Core

    /// Set the shell command.
    pub fn run(mut self, command: &str) -> Result<Self> {
        if command.is_empty() {
            return Err(Error::EmptyCommand {
                task: self.task_name(),
            });
        }
        self.data().command = Some(command.to_string());
        Ok(self)
    }

    /// Depend on the named tasks. Empty names and duplicates are ignored.
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

    /// Depend on the last tasks of each group.
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

    /// Add input glob patterns used for change detection.
    pub fn inputs<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data().inputs.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Run only when the condition holds.
    pub fn when(mut self, condition: impl Into<Condition>) -> Self {
        self.data().when = Some(condition.into());
        self
    }

    // Container

    /// Run inside a container image.
    pub fn container(mut self, image: &str) -> Result<Self> {
        if image.is_empty() {
            return Err(Error::EmptyContainerImage {
                owner: self.data().owner(),
            });
        }
        self.data().container = Some(image.to_string());
        Ok(self)
    }

    /// Set the working directory inside the container.
    pub fn workdir(mut self, path: &str) -> Self {
        self.data().workdir = Some(path.to_string());
        self
    }

    /// Mount a directory at an absolute container path.
    pub fn mount(mut self, dir: &Directory, path: &str) -> Result<Self> {
        check_mount_path(|| self.pipeline.tasks[self.index].owner(), path)?;
        self.pipeline.resources.ensure_directory(dir);
        self.data().mounts.push(dir.mount(path));
        Ok(self)
    }

    /// Mount a cache volume at an absolute container path.
    pub fn mount_cache(mut self, cache: &CacheVolume, path: &str) -> Result<Self> {
        check_mount_path(|| self.pipeline.tasks[self.index].owner(), path)?;
        self.pipeline.resources.ensure_cache(cache);
        self.data().mounts.push(cache.mount(path));
        Ok(self)
    }

    /// Mount the working directory at `/work` and use it as workdir.
    pub fn mount_cwd(self) -> Self {
        self.mount_cwd_unchecked(CWD_MOUNT_PATH)
    }

    /// Mount the working directory at `path` and use it as workdir.
    pub fn mount_cwd_at(self, path: &str) -> Result<Self> {
        check_mount_path(|| self.pipeline.tasks[self.index].owner(), path)?;
        Ok(self.mount_cwd_unchecked(path))
    }

    fn mount_cwd_unchecked(mut self, path: &str) -> Self {
        let cwd = self.pipeline.resources.directory(CWD, &[]);
        let data = self.data();
        data.mounts.push(cwd.mount(path));
        data.workdir = Some(path.to_string());
        self
    }

    /// Set an environment variable. A repeated key keeps its position.
    pub fn env(mut self, key: &str, value: &str) -> Result<Self> {
        if key.is_empty() {
            return Err(Error::EmptyEnvKey {
                owner: self.data().owner(),
            });
        }
        self.data().env.insert(key.to_string(), value.to_string());
        Ok(self)
    }

    /// Attach a service sidecar.
    pub fn service(mut self, image: &str, name: &str) -> Self {
        self.data().services.push(Service {
            image: image.to_string(),
            name: name.to_string(),
        });
        self
    }

    // Artifacts

    /// Declare a named output.
    pub fn output(mut self, name: &str, path: &str) -> Self {
        self.data()
            .outputs
            .insert(name.to_string(), path.to_string());
        self
    }

    /// Declare positional outputs, auto-named `output_<n>`.
    pub fn outputs<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data()
            .positional_outputs
            .extend(paths.into_iter().map(Into::into));
        self
    }

    /// Consume another task's output; also adds the dependency.
    pub fn input_from(mut self, task: &str, output: &str, dest: &str) -> Self {
        let data = self.data();
        data.task_inputs.push(TaskInput {
            from_task: task.to_string(),
            output: output.to_string(),
            dest: dest.to_string(),
        });
        data.add_dependency(task);
        self
    }

    // Secrets

    /// Require a secret by name.
    pub fn secret(mut self, name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::EmptySecretName {
                task: self.task_name(),
            });
        }
        self.data().secrets.push(name.to_string());
        Ok(self)
    }

    /// Require several secrets. Nothing is recorded if any name is empty.
    pub fn secrets<I, S>(mut self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.iter().any(String::is_empty) {
            return Err(Error::EmptySecretName {
                task: self.task_name(),
            });
        }
        self.data().secrets.extend(names);
        Ok(self)
    }

    /// Require a secret through a typed reference whose name must match.
    pub fn secret_from(mut self, name: &str, reference: SecretRef) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::EmptySecretName {
                task: self.task_name(),
            });
        }
        if reference.name() != name {
            return Err(Error::SecretNameMismatch {
                task: self.task_name(),
                name: name.to_string(),
                reference: reference.name().to_string(),
            });
        }
        self.data().secret_refs.push(reference);
        Ok(self)
    }

    // Execution

    /// Add a matrix axis. Setting the same key again replaces its values.
    pub fn matrix<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.data().matrix.insert(key.to_string(), values);
        self
    }

    /// Retry a failed run up to `attempts` times.
    pub fn retry(mut self, attempts: u32) -> Self {
        self.data().retry = attempts;
        self
    }

    /// Abort the task after `seconds`.
    pub fn timeout(mut self, seconds: u64) -> Result<Self> {
        if seconds == 0 {
            return Err(Error::InvalidTimeout {
                task: self.task_name(),
                field: "timeout",
            });
        }
        self.data().timeout = seconds;
        Ok(self)
    }

    /// Run on a named execution target.
    pub fn target(mut self, name: &str) -> Self {
        self.data().target = Some(name.to_string());
        self
    }

    /// Set Kubernetes resource requests.
    pub fn k8s(mut self, options: K8sOptions) -> Self {
        self.data().k8s = Some(options);
        self
    }

    /// Raw Kubernetes JSON; overrides any `raw` in [`K8sOptions`].
    pub fn k8s_raw(mut self, json: &str) -> Self {
        self.data().k8s_raw = json.to_string();
        self
    }

    /// Require runner labels.
    pub fn requires<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data()
            .requires
            .extend(labels.into_iter().map(Into::into));
        self
    }

    // AI-native metadata

    /// Source patterns this task covers.
    pub fn covers<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data()
            .covers
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Describe what the task is for.
    pub fn intent(mut self, description: &str) -> Self {
        self.data().intent = Some(description.to_string());
        self
    }

    /// Set criticality from a typed value or its wire name.
    pub fn criticality(mut self, level: impl EnumArg<Criticality>) -> Result<Self> {
        let level = level.into_enum()?;
        self.data().criticality = Some(level);
        Ok(self)
    }

    /// Shorthand for high criticality.
    pub fn critical(mut self) -> Self {
        self.data().criticality = Some(Criticality::High);
        self
    }

    /// What the assistant should do when the task fails.
    pub fn on_fail(mut self, action: impl EnumArg<OnFailAction>) -> Result<Self> {
        let action = action.into_enum()?;
        self.data().on_fail = Some(action);
        Ok(self)
    }

    /// How the engine selects this task.
    pub fn select(mut self, mode: impl EnumArg<SelectMode>) -> Result<Self> {
        let mode = mode.into_enum()?;
        self.data().select = Some(mode);
        Ok(self)
    }

    /// Shorthand for smart selection.
    pub fn smart(mut self) -> Self {
        self.data().select = Some(SelectMode::Smart);
        self
    }

    // Capabilities

    /// Advertise a capability, optionally with a value.
    pub fn provides(mut self, name: &str, value: Option<&str>) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::EmptyCapability {
                task: self.task_name(),
            });
        }
        self.data().provides.push(Capability {
            name: name.to_string(),
            value: value.filter(|v| !v.is_empty()).map(str::to_string),
        });
        Ok(self)
    }

    /// Depend on capabilities provided elsewhere.
    pub fn needs<I, S>(mut self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.iter().any(String::is_empty) {
            return Err(Error::EmptyCapability {
                task: self.task_name(),
            });
        }
        self.data().needs.extend(names);
        Ok(self)
    }

    // Templates

    /// Apply a registered template.
    ///
    /// Container and workdir are taken only if the task has none, template
    /// env is overridden by the task's own, and template mounts come first.
    pub fn from_template(mut self, template: &str) -> Result<Self> {
        let Some(tmpl) = self.pipeline.templates.get(template).cloned() else {
            return Err(Error::UnknownTemplate {
                task: self.task_name(),
                template: template.to_string(),
            });
        };
        let data = self.data();
        if data.container.as_deref().is_none_or(str::is_empty) {
            data.container = tmpl.container;
        }
        if data.workdir.as_deref().is_none_or(str::is_empty) {
            data.workdir = tmpl.workdir;
        }
        let mut env = tmpl.env;
        env.extend(std::mem::take(&mut data.env));
        data.env = env;
        let mut mounts = tmpl.mounts;
        mounts.append(&mut data.mounts);
        data.mounts = mounts;
        debug!("Applied template '{}' to task '{}'", template, data.name);
        Ok(self)
    }
}

impl From<TaskBuilder<'_>> for TaskRef {
    fn from(builder: TaskBuilder<'_>) -> Self {
        builder.handle()
    }
}

impl From<&TaskBuilder<'_>> for TaskRef {
    fn from(builder: &TaskBuilder<'_>) -> Self {
        builder.handle()
    }
}
