//! Intermediate representation for sykli pipelines.
//!
//! The IR is the sole contract between a pipeline definition and the
//! execution engine. A document carries a `version`, an optional
//! `resources` map (version "2" only), and the ordered `tasks` array.
//!
//! ## Version History
//! - "2": containers, mounts, and the resource registry
//! - "1": commands, dependencies, and the remaining task options

mod enums;
mod schema;

pub use enums::*;
pub use schema::*;
