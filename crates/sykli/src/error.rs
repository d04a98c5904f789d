//! Error types for the sykli SDK
//!
//! Builder misuse is reported immediately by the setter that received the bad
//! value. Graph-level problems are collected by [`Pipeline::validate`] and
//! surface as [`Error::Validation`].
//!
//! [`Pipeline::validate`]: crate::Pipeline::validate

use crate::validate::ValidationError;
use miette::Diagnostic;
use sykli_ir::ParseEnumError;
use thiserror::Error;

/// Main error type for pipeline building and emission
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A name or identifier was empty
    #[error("{kind} cannot be empty")]
    #[diagnostic(code(sykli::builder::empty_name))]
    EmptyName {
        /// What kind of name was empty (e.g. `task name`)
        kind: &'static str,
    },

    /// A task or template name was registered twice
    #[error("{kind} '{name}' already exists")]
    #[diagnostic(code(sykli::builder::duplicate))]
    Duplicate {
        /// `task` or `template`
        kind: &'static str,
        /// The conflicting name
        name: String,
    },

    /// A cache name that would collide with directory resource ids
    #[error("cache name '{name}' cannot start with '{prefix}'")]
    #[diagnostic(
        code(sykli::builder::reserved_cache_name),
        help("directory resources use ids of the form 'src:<path>'")
    )]
    ReservedCacheName {
        /// The rejected name
        name: String,
        /// The reserved prefix
        prefix: &'static str,
    },

    /// `run` was called with an empty command
    #[error("task '{task}': command cannot be empty")]
    #[diagnostic(code(sykli::builder::empty_command))]
    EmptyCommand {
        /// Task receiving the command
        task: String,
    },

    /// A timeout of zero seconds
    #[error("task '{task}': {field} must be greater than zero")]
    #[diagnostic(code(sykli::builder::invalid_timeout))]
    InvalidTimeout {
        /// Task or gate receiving the timeout
        task: String,
        /// Which timeout field
        field: &'static str,
    },

    /// A mount target that is not an absolute path
    #[error("{owner}: mount path must be absolute, got '{path}'")]
    #[diagnostic(
        code(sykli::builder::relative_mount_path),
        help("container paths start with '/', e.g. '/work' or '/root/.cache'")
    )]
    RelativeMountPath {
        /// `task 'x'` or `template 'x'`
        owner: String,
        /// The rejected path
        path: String,
    },

    /// An empty container image reference
    #[error("{owner}: container image cannot be empty")]
    #[diagnostic(code(sykli::builder::empty_container_image))]
    EmptyContainerImage {
        /// `task 'x'` or `template 'x'`
        owner: String,
    },

    /// An environment variable with an empty key
    #[error("{owner}: env key cannot be empty")]
    #[diagnostic(code(sykli::builder::empty_env_key))]
    EmptyEnvKey {
        /// `task 'x'` or `template 'x'`
        owner: String,
    },

    /// A secret with an empty name
    #[error("task '{task}': secret name cannot be empty")]
    #[diagnostic(code(sykli::builder::empty_secret_name))]
    EmptySecretName {
        /// Task declaring the secret
        task: String,
    },

    /// A capability label with an empty name
    #[error("task '{task}': capability name cannot be empty")]
    #[diagnostic(code(sykli::builder::empty_capability))]
    EmptyCapability {
        /// Task declaring the capability
        task: String,
    },

    /// A typed secret reference whose name differs from the declared secret
    #[error("task '{task}': secret '{name}' does not match reference name '{reference}'")]
    #[diagnostic(code(sykli::builder::secret_name_mismatch))]
    SecretNameMismatch {
        /// Task declaring the secret
        task: String,
        /// Name passed to the setter
        name: String,
        /// Name carried by the reference
        reference: String,
    },

    /// `from_template` named a template that was never registered
    #[error("task '{task}': unknown template '{template}'")]
    #[diagnostic(code(sykli::builder::unknown_template))]
    UnknownTemplate {
        /// Task applying the template
        task: String,
        /// The missing template name
        template: String,
    },

    /// A closed-enumeration value outside its allowed set
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidEnumValue(#[from] ParseEnumError),

    /// Pipeline configuration could not be loaded
    #[error("Configuration error: {message}")]
    #[diagnostic(code(sykli::config::invalid))]
    Config {
        /// Parser message
        message: String,
    },

    /// The pipeline failed graph-level validation
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    /// The dependency graph could not be ordered
    #[error(transparent)]
    #[diagnostic(code(sykli::graph))]
    Graph(#[from] sykli_task_graph::Error),

    /// The IR document could not be encoded
    #[error("Serialization error: {0}")]
    #[diagnostic(code(sykli::serialization))]
    Serialization(#[from] serde_json::Error),

    /// Writing to the output sink failed
    #[error("I/O error: {0}")]
    #[diagnostic(code(sykli::io))]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an empty-name error
    pub(crate) const fn empty_name(kind: &'static str) -> Self {
        Self::EmptyName { kind }
    }

    /// Create a configuration error with a message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// The validation failure behind this error, if any.
    #[must_use]
    pub const fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, Error>;
