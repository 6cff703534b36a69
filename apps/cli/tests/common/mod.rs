//! Shared helpers for dbcfg integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const FIXTURE: &str = include_str!("../fixtures/dbnet_r50dcnv2.toml");
pub const ANN_FILE: &str = "tests/data/toy_dataset/instances_test.json";
pub const IMG_PREFIX: &str = "tests/data/toy_dataset/imgs";

/// Temp directory with the toy dataset the fixture points at.
pub fn setup_workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join(IMG_PREFIX)).unwrap();
    fs::write(
        temp_dir.path().join(ANN_FILE),
        r#"{"images": [], "annotations": [], "categories": []}"#,
    )
    .unwrap();
    temp_dir
}

/// Write `contents` under the workspace and return its path.
pub fn write_config(temp_dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = temp_dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// The fixture with `from` replaced by `to`. Panics if `from` is absent.
pub fn patched(from: &str, to: &str) -> String {
    assert!(FIXTURE.contains(from), "fixture does not contain {from:?}");
    FIXTURE.replacen(from, to, 1)
}

/// `dbcfg` running inside `temp_dir`, isolated from any user config.
pub fn dbcfg(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dbcfg").unwrap();
    cmd.current_dir(temp_dir.path())
        .env("HOME", temp_dir.path())
        .env("NO_COLOR", "1");
    cmd
}
