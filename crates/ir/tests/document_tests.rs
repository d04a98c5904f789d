//! Decoding IR documents the way the engine consumes them.

use sykli_ir::{GateStrategy, IrVersion, MountType, PipelineDocument, Resource, SecretSource};

const V2_DOCUMENT: &str = concat!(
    r#"{"version":"2","#,
    r#""resources":{"src:.":{"type":"directory","path":"."},"cargo":{"type":"cache","name":"cargo"}},"#,
    r#""tasks":["#,
    r#"{"name":"build","command":"cargo build","container":"rust:1.85","workdir":"/work","#,
    r#""mounts":[{"resource":"src:.","path":"/work","type":"directory"},{"resource":"cargo","path":"/usr/local/cargo","type":"cache"}],"#,
    r#""outputs":{"binary":"target/release/app"},"secret_refs":[{"name":"TOKEN","source":"vault","key":"ci/token"}]},"#,
    r#"{"name":"approve","depends_on":["build"],"gate":{"strategy":"env","timeout":600,"env_var":"APPROVED"}}"#,
    r#"]}"#
);

#[test]
fn test_decode_v2_document() {
    let doc: PipelineDocument = serde_json::from_str(V2_DOCUMENT).unwrap();
    assert_eq!(doc.version, IrVersion::V2);
    assert_eq!(
        doc.resources["cargo"],
        Resource::Cache {
            name: "cargo".to_string()
        }
    );

    let build = doc.task("build").unwrap();
    assert_eq!(build.mounts[1].mount_type, MountType::Cache);
    assert_eq!(build.secret_refs[0].source, SecretSource::Vault);
    assert_eq!(build.outputs["binary"], "target/release/app");

    let approve = doc.task("approve").unwrap();
    assert!(approve.command.is_none());
    let gate = approve.gate.as_ref().unwrap();
    assert_eq!(gate.strategy, GateStrategy::Env);
    assert_eq!(gate.timeout, 600);
}

#[test]
fn test_reencoding_is_byte_identical() {
    let doc: PipelineDocument = serde_json::from_str(V2_DOCUMENT).unwrap();
    assert_eq!(serde_json::to_string(&doc).unwrap(), V2_DOCUMENT);
}

#[test]
fn test_unknown_enum_value_is_rejected() {
    let json = r#"{"version":"1","tasks":[{"name":"t","semantic":{"criticality":"urgent"}}]}"#;
    assert!(serde_json::from_str::<PipelineDocument>(json).is_err());
}

#[test]
fn test_unknown_version_is_rejected() {
    let json = r#"{"version":"3","tasks":[]}"#;
    assert!(serde_json::from_str::<PipelineDocument>(json).is_err());
}
