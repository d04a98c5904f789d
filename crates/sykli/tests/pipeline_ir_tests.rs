//! End-to-end tests: build pipelines and check the emitted IR.

use serde_json::{Value, json};
use sykli::{
    Condition, Criticality, Error, GateStrategy, K8sOptions, OnFailAction, Pipeline, SecretRef,
    Stage, ValidationErrorKind,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("sykli=debug")
        .with_test_writer()
        .try_init();
}

fn emit(p: &Pipeline) -> Value {
    serde_json::from_str(&p.to_json().unwrap()).unwrap()
}

#[test]
fn test_minimal_pipeline_is_version_one() {
    init_tracing();
    let mut p = Pipeline::new();
    p.task("lint").unwrap().run("cargo clippy").unwrap();
    p.task("test")
        .unwrap()
        .run("cargo test")
        .unwrap()
        .after(["lint"]);
    p.task("build")
        .unwrap()
        .run("cargo build")
        .unwrap()
        .after(["test"]);

    assert_eq!(
        p.to_json().unwrap(),
        concat!(
            r#"{"version":"1","tasks":["#,
            r#"{"name":"lint","command":"cargo clippy"},"#,
            r#"{"name":"test","command":"cargo test","depends_on":["lint"]},"#,
            r#"{"name":"build","command":"cargo build","depends_on":["test"]}"#,
            r#"]}"#
        )
    );
}

#[test]
fn test_every_optional_field_is_omitted_when_unset() {
    let mut p = Pipeline::new();
    p.task("t").unwrap().run("x").unwrap();
    let task = &emit(&p)["tasks"][0];
    let keys: Vec<&str> = task.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["name", "command"]);
}

#[test]
fn test_fully_configured_task_field_order() {
    let mut p = Pipeline::new();
    let src = p.dir(".").unwrap();
    let cache = p.cache("cargo").unwrap();
    p.task("build").unwrap().run("make").unwrap();
    p.task("db").unwrap().run("pg").unwrap();
    p.task("t")
        .unwrap()
        .run("cargo test")
        .unwrap()
        .container("rust:1.85")
        .unwrap()
        .workdir("/src")
        .env("RUST_LOG", "debug")
        .unwrap()
        .mount(&src, "/src")
        .unwrap()
        .mount_cache(&cache, "/usr/local/cargo")
        .unwrap()
        .inputs(["**/*.rs"])
        .input_from("build", "binary", "/bin/app")
        .output("report", "junit.xml")
        .after(["db"])
        .when(Condition::branch("main"))
        .secret("TOKEN")
        .unwrap()
        .secret_from("KEY", SecretRef::from_vault("KEY", "ci/key"))
        .unwrap()
        .matrix("os", ["linux", "macos"])
        .service("postgres:16", "db")
        .retry(2)
        .timeout(300)
        .unwrap()
        .target("k8s")
        .k8s(K8sOptions::new().memory("2Gi").cpu("1"))
        .requires(["gpu"])
        .provides("report", None)
        .unwrap()
        .needs(["db"])
        .unwrap()
        .covers(["src/**"])
        .intent("unit tests")
        .criticality(Criticality::High)
        .unwrap()
        .on_fail(OnFailAction::Analyze)
        .unwrap()
        .smart();

    let doc = emit(&p);
    let task = &doc["tasks"][2];
    let keys: Vec<&str> = task.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "name",
            "command",
            "container",
            "workdir",
            "env",
            "mounts",
            "inputs",
            "task_inputs",
            "outputs",
            "depends_on",
            "when",
            "secrets",
            "secret_refs",
            "matrix",
            "services",
            "retry",
            "timeout",
            "target",
            "k8s",
            "requires",
            "provides",
            "needs",
            "semantic",
            "ai_hooks",
        ]
    );
    assert_eq!(task["depends_on"], json!(["build", "db"]));
    assert_eq!(
        task["mounts"][1],
        json!({"resource": "cargo", "path": "/usr/local/cargo", "type": "cache"})
    );
    assert_eq!(
        task["secret_refs"],
        json!([{"name": "KEY", "source": "vault", "key": "ci/key"}])
    );
    assert_eq!(
        task["semantic"],
        json!({"covers": ["src/**"], "intent": "unit tests", "criticality": "high"})
    );
    assert_eq!(task["ai_hooks"], json!({"on_fail": "analyze", "select": "smart"}));
    assert_eq!(task["provides"], json!([{"name": "report"}]));
    assert_eq!(doc["version"], "2");
    assert_eq!(
        doc["resources"],
        json!({
            "src:.": {"type": "directory", "path": "."},
            "cargo": {"type": "cache", "name": "cargo"}
        })
    );
}

#[test]
fn test_gate_serialization() {
    let mut p = Pipeline::new();
    p.task("build").unwrap().run("make").unwrap();
    p.gate("approve")
        .unwrap()
        .strategy(GateStrategy::File)
        .unwrap()
        .file_path("/tmp/approved")
        .message("Deploy?")
        .after(["build"]);
    p.task("deploy")
        .unwrap()
        .run("./deploy")
        .unwrap()
        .after(["approve"]);

    let doc = emit(&p);
    let gate = &doc["tasks"][1];
    assert!(gate.get("command").is_none());
    assert_eq!(
        gate["gate"],
        json!({
            "strategy": "file",
            "timeout": 3600,
            "message": "Deploy?",
            "file_path": "/tmp/approved"
        })
    );
}

#[test]
fn test_chain_and_parallel_wiring() {
    let mut p = Pipeline::new();
    let fmt = p.task("fmt").unwrap().run("cargo fmt --check").unwrap().handle();
    let lint = p.task("lint").unwrap().run("cargo clippy").unwrap().handle();
    let test = p.task("test").unwrap().run("cargo test").unwrap().handle();
    let checks = p.parallel("checks", [&fmt, &lint]);
    let tail = p.chain([Stage::from(&checks), Stage::from(&test)]);
    p.task("package")
        .unwrap()
        .run("cargo package")
        .unwrap()
        .after_group([&tail]);

    let doc = emit(&p);
    assert_eq!(doc["tasks"][0].get("depends_on"), None);
    assert_eq!(doc["tasks"][2]["depends_on"], json!(["fmt", "lint"]));
    assert_eq!(doc["tasks"][3]["depends_on"], json!(["test"]));
    assert_eq!(
        p.execution_levels().unwrap(),
        vec![
            vec!["fmt".to_string(), "lint".to_string()],
            vec!["test".to_string()],
            vec!["package".to_string()],
        ]
    );
}

#[test]
fn test_matrix_generates_tasks() {
    let mut p = Pipeline::new();
    let group = p
        .matrix("tests", ["stable", "beta", "nightly"], |p, toolchain| {
            Ok(p
                .task(&format!("test-{toolchain}"))?
                .run(&format!("cargo +{toolchain} test"))?
                .handle())
        })
        .unwrap();
    p.task("report")
        .unwrap()
        .run("collect")
        .unwrap()
        .after_group([&group]);

    let doc = emit(&p);
    assert_eq!(doc["tasks"].as_array().unwrap().len(), 4);
    assert_eq!(
        doc["tasks"][3]["depends_on"],
        json!(["test-stable", "test-beta", "test-nightly"])
    );
}

#[test]
fn test_unknown_dependency_blocks_emission() {
    let mut p = Pipeline::new();
    p.task("build").unwrap().run("make").unwrap();
    p.task("deploy")
        .unwrap()
        .run("./deploy")
        .unwrap()
        .after(["biuld"]);

    let err = p.to_json().unwrap_err();
    let validation = err.as_validation().unwrap();
    assert_eq!(validation.kind, ValidationErrorKind::UnknownDependency);
    assert_eq!(validation.task, "deploy");
    assert_eq!(validation.suggestion.as_deref(), Some("build"));

    let mut out = Vec::new();
    assert!(p.emit_to(&mut out).is_err());
    assert!(out.is_empty());
}

#[test]
fn test_cycle_blocks_emission() {
    let mut p = Pipeline::new();
    p.task("a").unwrap().run("a").unwrap().after(["c"]);
    p.task("b").unwrap().run("b").unwrap().after(["a"]);
    p.task("c").unwrap().run("c").unwrap().after(["b"]);
    let err = p.to_document().unwrap_err();
    let validation = err.as_validation().unwrap();
    assert_eq!(validation.wire_code(), "CYCLE_DETECTED");
    assert_eq!(validation.cycle, vec!["a", "c", "b", "a"]);
}

#[test]
fn test_reserialization_is_byte_identical() {
    let mut p = Pipeline::new();
    let src = p.dir_with_globs("src", ["**/*.rs"]).unwrap();
    p.task("test")
        .unwrap()
        .run("cargo test")
        .unwrap()
        .mount(&src, "/src")
        .unwrap()
        .env("B", "2")
        .unwrap()
        .env("A", "1")
        .unwrap()
        .outputs(["a", "b"])
        .output("output_0", "named");
    let first = p.to_json().unwrap();
    assert_eq!(first, p.to_json().unwrap());
    let doc = emit(&p);
    assert_eq!(
        doc["tasks"][0]["outputs"],
        json!({"output_0": "named", "output_0_0": "a", "output_1": "b"})
    );
    assert!(first.contains(r#""env":{"B":"2","A":"1"}"#));
}

#[test]
fn test_builder_errors_leave_pipeline_usable() {
    let mut p = Pipeline::new();
    p.task("a").unwrap().run("a").unwrap();
    assert!(matches!(
        p.task("a").err().unwrap(),
        Error::Duplicate { .. }
    ));
    assert!(matches!(
        p.task("b").unwrap().run("b").unwrap().criticality("urgent").err().unwrap(),
        Error::InvalidEnumValue(_)
    ));
    assert_eq!(emit(&p)["tasks"].as_array().unwrap().len(), 2);
}

#[test]
fn test_template_application_through_ir() {
    let mut p = Pipeline::new();
    let src = p.dir(".").unwrap();
    p.template("rust")
        .unwrap()
        .container("rust:1.85")
        .unwrap()
        .mount(&src, "/src")
        .unwrap()
        .workdir("/src")
        .env("CARGO_TERM_COLOR", "always")
        .unwrap();
    p.task("test")
        .unwrap()
        .from_template("rust")
        .unwrap()
        .run("cargo test")
        .unwrap();

    let doc = emit(&p);
    let task = &doc["tasks"][0];
    assert_eq!(task["container"], "rust:1.85");
    assert_eq!(task["workdir"], "/src");
    assert_eq!(task["env"], json!({"CARGO_TERM_COLOR": "always"}));
    assert_eq!(doc["version"], "2");
}

#[test]
fn test_explain_output() {
    let mut p = Pipeline::new();
    p.task("test").unwrap().run("cargo test").unwrap();
    p.task("release")
        .unwrap()
        .run("cargo publish")
        .unwrap()
        .after(["test"])
        .when(Condition::tag("v*"));
    let ctx = sykli::ExplainContext {
        tag: "v1.0.0".to_string(),
        ..Default::default()
    };
    let text = p.explain(Some(&ctx)).unwrap();
    assert_eq!(
        text,
        "Pipeline: 2 tasks\n  test: cargo test\n  release: cargo publish (after: test) [RUN: tag matches 'v*']\n"
    );
}
