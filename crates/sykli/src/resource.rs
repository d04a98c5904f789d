//! Mountable resources and the pipeline's resource registry.

use indexmap::IndexMap;
use sykli_ir::{Mount, MountType, Resource};
use tracing::debug;

/// Path of the directory registered by `mount_cwd`.
pub(crate) const CWD: &str = ".";

/// Container path used by `mount_cwd`.
pub(crate) const CWD_MOUNT_PATH: &str = "/work";

/// Prefix of every directory resource id.
pub(crate) const DIRECTORY_ID_PREFIX: &str = "src:";

/// Handle to a source directory.
///
/// Two handles are the same resource exactly when their ids are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Directory {
    path: String,
}

impl Directory {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }

    /// Resource id, `src:<path>`.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{DIRECTORY_ID_PREFIX}{}", self.path)
    }

    /// Host path of the directory.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn mount(&self, path: &str) -> Mount {
        Mount {
            resource: self.id(),
            path: path.to_string(),
            mount_type: MountType::Directory,
        }
    }
}

/// Handle to a named cache volume.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheVolume {
    name: String,
}

impl CacheVolume {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Resource id; a cache is identified by its name, which never carries
    /// the directory id prefix.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.name
    }

    /// Cache name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn mount(&self, path: &str) -> Mount {
        Mount {
            resource: self.name.clone(),
            path: path.to_string(),
            mount_type: MountType::Cache,
        }
    }
}

/// Resources keyed by id, in first-registration order.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResourceRegistry {
    entries: IndexMap<String, Resource>,
}

impl ResourceRegistry {
    /// Register a directory, appending `globs` to any already recorded.
    pub(crate) fn directory(&mut self, path: &str, globs: &[String]) -> Directory {
        let dir = Directory::new(path);
        let entry = self.entries.entry(dir.id()).or_insert_with(|| {
            debug!("Registered directory resource '{}'", path);
            Resource::Directory {
                path: path.to_string(),
                globs: Vec::new(),
            }
        });
        if let Resource::Directory { globs: existing, .. } = entry {
            for glob in globs {
                if !existing.contains(glob) {
                    existing.push(glob.clone());
                }
            }
        }
        dir
    }

    /// Register a cache volume if it is not already present.
    pub(crate) fn cache(&mut self, name: &str) -> CacheVolume {
        self.entries.entry(name.to_string()).or_insert_with(|| {
            debug!("Registered cache resource '{}'", name);
            Resource::Cache {
                name: name.to_string(),
            }
        });
        CacheVolume::new(name)
    }

    /// Make sure a mount's resource appears in the registry.
    ///
    /// Handles can outlive or come from another pipeline; mounting one
    /// registers it here.
    pub(crate) fn ensure_directory(&mut self, dir: &Directory) {
        self.directory(dir.path(), &[]);
    }

    pub(crate) fn ensure_cache(&mut self, cache: &CacheVolume) {
        self.cache(cache.name());
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn to_ir(&self) -> IndexMap<String, Resource> {
        self.entries.clone()
    }
}
