//! Integration tests for `_base_` inheritance across files and formats.

mod common;

use common::{dbnet_document, Workspace};
use dbnet_config::schema::{LrPolicySpec, OptimizerSpec};
use dbnet_config::{ConfigError, ErrorKind};
use serde_json::json;

const SCHEDULE: &str = r#"
total_epochs = 1200

[optimizer]
type = "SGD"
lr = 0.007
momentum = 0.9
weight_decay = 0.0001

[optimizer_config]

[lr_config]
policy = "poly"
power = 0.9
min_lr = 1e-7
by_epoch = false
"#;

const RUNTIME: &str = r"
checkpoint_config:
  interval: 10
log_config:
  interval: 5
  hooks:
    - type: TextLoggerHook
log_level: INFO
";

fn write_bases(ws: &Workspace) {
    ws.write("configs/_base_/schedules/schedule_1200e.toml", SCHEDULE);
    ws.write("configs/_base_/runtime_10e.yaml", RUNTIME);
}

fn child_document() -> serde_json::Value {
    let mut doc = dbnet_document();
    doc["_base_"] = json!(["_base_/schedules/schedule_1200e.toml", "_base_/runtime_10e.yaml"]);
    doc
}

#[test]
fn test_bases_merge_beneath_document() {
    let ws = Workspace::new();
    write_bases(&ws);
    let path = ws.write("configs/dbnet.json", &serde_json::to_string(&child_document()).unwrap());

    let config = ws.loader().load_path(&path).unwrap();
    // the document's own total_epochs wins over the schedule's
    assert_eq!(config.total_epochs, Some(100));
    assert!(matches!(config.optimizer, Some(OptimizerSpec::Sgd { .. })));
    assert!(matches!(config.lr_config, Some(LrPolicySpec::Poly { by_epoch: false, .. })));
    assert_eq!(config.checkpoint_config.map(|c| c.interval), Some(10));
}

#[test]
fn test_child_overrides_nested_keys() {
    let ws = Workspace::new();
    write_bases(&ws);
    let mut doc = child_document();
    doc["optimizer"] = json!({"lr": 0.001});
    let path = ws.write("configs/dbnet.json", &serde_json::to_string(&doc).unwrap());

    let config = ws.loader().load_path(&path).unwrap();
    match config.optimizer {
        Some(OptimizerSpec::Sgd { lr, momentum, .. }) => {
            assert!((lr - 0.001).abs() < f64::EPSILON);
            assert!((momentum - 0.9).abs() < f64::EPSILON);
        }
        other => panic!("unexpected optimizer {other:?}"),
    }
}

#[test]
fn test_delete_replaces_inherited_section() {
    let ws = Workspace::new();
    write_bases(&ws);
    let mut doc = child_document();
    doc["optimizer"] = json!({"_delete_": true, "type": "Adam", "lr": 0.001});
    let path = ws.write("configs/dbnet.json", &serde_json::to_string(&doc).unwrap());

    let config = ws.loader().load_path(&path).unwrap();
    assert!(matches!(config.optimizer, Some(OptimizerSpec::Adam(_))));
}

#[test]
fn test_merge_without_delete_keeps_stale_keys() {
    let ws = Workspace::new();
    write_bases(&ws);
    let mut doc = child_document();
    doc["optimizer"] = json!({"type": "Adam", "lr": 0.001});
    let path = ws.write("configs/dbnet.json", &serde_json::to_string(&doc).unwrap());

    // `momentum` survives the merge and Adam does not accept it
    let err = ws.loader().load_path(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedField);
    assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("optimizer.momentum"));
}

#[test]
fn test_missing_base_file() {
    let ws = Workspace::new();
    let path = ws.write("configs/dbnet.json", &serde_json::to_string(&child_document()).unwrap());

    let err = ws.loader().load_path(&path).unwrap_err();
    match err {
        ConfigError::PathNotFound { path, target } => {
            assert_eq!(path.to_string(), "_base_[0]");
            assert_eq!(target.to_string_lossy(), "_base_/schedules/schedule_1200e.toml");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_base_cycle_detected() {
    let ws = Workspace::new();
    ws.write("configs/a.toml", "_base_ = \"b.toml\"\n");
    ws.write("configs/b.toml", "_base_ = [\"a.toml\"]\n");

    let err = ws.loader().load_path(ws.path().join("configs/a.toml")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BaseCycle);
}

#[test]
fn test_value_bases_resolve_against_base_dir() {
    let ws = Workspace::new();
    write_bases(&ws);
    let mut doc = dbnet_document();
    doc["_base_"] = json!("configs/_base_/runtime_10e.yaml");

    let config = ws.loader().load_value(doc).unwrap();
    assert_eq!(config.log_config.map(|c| c.interval), Some(5));
}
