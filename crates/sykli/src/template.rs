//! Reusable task configuration.

use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::resource::{CacheVolume, Directory};
use crate::task::check_mount_path;
use indexmap::IndexMap;
use sykli_ir::Mount;

/// Settings a template contributes to the tasks that apply it.
#[derive(Debug, Clone, Default)]
pub(crate) struct TemplateData {
    pub(crate) container: Option<String>,
    pub(crate) workdir: Option<String>,
    pub(crate) env: IndexMap<String, String>,
    pub(crate) mounts: Vec<Mount>,
}

/// Fluent handle for configuring a template registered with [`Pipeline::template`].
///
/// Tasks copy the template when they apply it, so configure templates first.
pub struct TemplateBuilder<'a> {
    pipeline: &'a mut Pipeline,
    name: String,
}

impl<'a> TemplateBuilder<'a> {
    pub(crate) fn new(pipeline: &'a mut Pipeline, name: String) -> Self {
        Self { pipeline, name }
    }

    /// Name of the template.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn owner(&self) -> String {
        format!("template '{}'", self.name)
    }

    fn data(&mut self) -> &mut TemplateData {
        self.pipeline
            .templates
            .entry(self.name.clone())
            .or_default()
    }

    /// Container image for tasks that set none.
    pub fn container(mut self, image: &str) -> Result<Self> {
        if image.is_empty() {
            return Err(Error::EmptyContainerImage {
                owner: self.owner(),
            });
        }
        self.data().container = Some(image.to_string());
        Ok(self)
    }

    /// Working directory for tasks that set none.
    pub fn workdir(mut self, path: &str) -> Self {
        self.data().workdir = Some(path.to_string());
        self
    }

    /// Base environment variable; a task's own value wins.
    pub fn env(mut self, key: &str, value: &str) -> Result<Self> {
        if key.is_empty() {
            return Err(Error::EmptyEnvKey {
                owner: self.owner(),
            });
        }
        self.data().env.insert(key.to_string(), value.to_string());
        Ok(self)
    }

    /// Mount a directory ahead of the task's own mounts.
    pub fn mount(mut self, dir: &Directory, path: &str) -> Result<Self> {
        check_mount_path(|| self.owner(), path)?;
        self.pipeline.resources.ensure_directory(dir);
        self.data().mounts.push(dir.mount(path));
        Ok(self)
    }

    /// Mount a cache volume ahead of the task's own mounts.
    pub fn mount_cache(mut self, cache: &CacheVolume, path: &str) -> Result<Self> {
        check_mount_path(|| self.owner(), path)?;
        self.pipeline.resources.ensure_cache(cache);
        self.data().mounts.push(cache.mount(path));
        Ok(self)
    }
}
