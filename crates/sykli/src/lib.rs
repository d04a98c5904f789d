//! Pipeline SDK for sykli.
//!
//! Describe tasks with a fluent builder, compose them with `chain`,
//! `parallel` and `matrix`, and emit the JSON IR the sykli engine executes.
//!
//! # Key Types
//!
//! - [`Pipeline`]: owns tasks, gates, resources and templates
//! - [`TaskBuilder`] / [`GateBuilder`]: per-task fluent setters
//! - [`Condition`]: type-safe `when` expressions
//! - [`ValidationError`]: structural problems found before emission
//!
//! # Example
//!
//! ```ignore
//! use sykli::{Condition, Pipeline};
//!
//! let mut p = Pipeline::new();
//! p.task("lint")?.run("cargo clippy")?;
//! p.task("test")?.run("cargo test")?.after(["lint"]);
//! p.task("deploy")?
//!     .run("./deploy.sh")?
//!     .after(["test"])
//!     .when(Condition::branch("main"));
//! p.emit_to(std::io::stdout())?;
//! ```
//!
//! Builder calls fail immediately on bad arguments. Graph problems (missing
//! commands, unknown dependencies, cycles, malformed quantities) are reported
//! by [`Pipeline::validate`], which every emit and explain call runs first.

mod combinators;
mod condition;
mod config;
mod error;
mod explain;
mod gate;
mod k8s;
mod pipeline;
mod preset;
mod resource;
mod serialize;
pub mod similarity;
mod task;
mod template;
mod validate;

pub use combinators::{Stage, TaskGroup, TaskRef};
pub use condition::{Condition, Evaluation};
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use explain::ExplainContext;
pub use gate::{DEFAULT_GATE_TIMEOUT, GateBuilder};
pub use k8s::K8sOptions;
pub use pipeline::Pipeline;
pub use preset::RustPreset;
pub use resource::{CacheVolume, Directory};
pub use task::{EnumArg, SecretRef, TaskBuilder};
pub use template::TemplateBuilder;
pub use validate::{ValidationError, ValidationErrorKind};

pub use sykli_ir::{
    Criticality, GateStrategy, IrVersion, OnFailAction, PipelineDocument, SecretSource,
    SelectMode,
};
