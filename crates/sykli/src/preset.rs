//! Ready-made tasks for Rust projects.

use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::task::TaskBuilder;

const RUST_INPUTS: [&str; 3] = ["**/*.rs", "Cargo.toml", "Cargo.lock"];

/// Registers conventional cargo tasks on a pipeline.
pub struct RustPreset<'a> {
    pipeline: &'a mut Pipeline,
}

impl<'a> RustPreset<'a> {
    /// `test`: `cargo test`.
    pub fn test(self) -> Result<TaskBuilder<'a>> {
        self.cargo("test", "cargo test")
    }

    /// `lint`: clippy with warnings denied.
    pub fn lint(self) -> Result<TaskBuilder<'a>> {
        self.cargo("lint", "cargo clippy -- -D warnings")
    }

    /// `build`: release build producing `output`.
    pub fn build(self, output: &str) -> Result<TaskBuilder<'a>> {
        Ok(self
            .cargo("build", "cargo build --release")?
            .outputs([output]))
    }

    fn cargo(self, name: &str, command: &str) -> Result<TaskBuilder<'a>> {
        self.pipeline
            .task(name)?
            .run(command)
            .map(|task| task.inputs(RUST_INPUTS))
    }
}

impl Pipeline {
    /// Conventional cargo tasks.
    pub fn rust(&mut self) -> RustPreset<'_> {
        RustPreset { pipeline: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_tasks() {
        let mut p = Pipeline::new();
        p.rust().lint().unwrap();
        p.rust().test().unwrap().after(["lint"]);
        p.rust().build("target/release/app").unwrap().after(["test"]);

        let doc = p.to_document().unwrap();
        let build = doc.task("build").unwrap();
        assert_eq!(build.command.as_deref(), Some("cargo build --release"));
        assert_eq!(build.inputs, RUST_INPUTS);
        assert_eq!(build.outputs["output_0"], "target/release/app");
        assert_eq!(
            doc.task("lint").unwrap().command.as_deref(),
            Some("cargo clippy -- -D warnings")
        );
    }

    #[test]
    fn test_preset_names_collide_with_existing_tasks() {
        let mut p = Pipeline::new();
        p.task("test").unwrap().run("make test").unwrap();
        assert!(p.rust().test().is_err());
    }
}
