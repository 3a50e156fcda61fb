//! End-to-end runs of the `goseal` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn goseal(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_goseal"))
        .args(args)
        .current_dir(dir)
        .env("GOSEAL_CONFIG_DIR", dir.join("no-global"))
        .output()
        .unwrap()
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/lib.rs"), "pub mod model;\npub mod service;\n").unwrap();
    fs::write(
        dir.path().join("src/model.rs"),
        "pub struct Order {\n    pub total: u32,\n}\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("src/service.rs"),
        "use crate::model::Order;\n\npub fn discount(order: &mut Order) {\n    order.total -= 1;\n}\n",
    )
    .unwrap();
    dir
}

#[test]
fn check_reports_and_fails() {
    let dir = project();
    let out = goseal(dir.path(), &["check", "--format", "compact"]);
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("src/service.rs:4:5: error [GS003]"), "{stdout}");
}

#[test]
fn text_output_lists_each_finding() {
    let dir = project();
    let out = goseal(dir.path(), &["check"]);
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("GS003 mutation-scope at src/service.rs:4:5\n"), "{stdout}");
    assert!(stdout.contains("  error: direct assignment to field total of sealed struct Order"));
}

#[test]
fn project_config_is_picked_up() {
    let dir = project();
    fs::write(dir.path().join(".goseal.yml"), "severity: warning\n").unwrap();
    let out = goseal(dir.path(), &["check", "--format", "json"]);
    assert_eq!(out.status.code(), Some(0));
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["violations"][0]["severity"], "warning");
    assert_eq!(json["units_checked"], 3);
}

#[test]
fn units_file_is_analyzed() {
    let dir = TempDir::new().unwrap();
    let units = r#"{
        "package": "example.com/app",
        "files": [{
            "path": "app/main.go",
            "items": [{
                "item": "func",
                "name": "main",
                "body": [{
                    "stmt": "expr",
                    "kind": { "expr": "literal", "elements": [] },
                    "ty": { "type": "named", "name": "User", "package": "example.com/domain", "aggregate": true },
                    "position": { "line": 3, "column": 7 }
                }]
            }]
        }]
    }"#;
    fs::write(dir.path().join("units.json"), units).unwrap();
    let out = goseal(dir.path(), &["check", "--units", "units.json", "--format", "compact"]);
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(out.status.code(), Some(1), "{stdout}");
    assert!(stdout.contains("app/main.go:3:7: error [GS001]"), "{stdout}");
}

#[test]
fn init_writes_config_once() {
    let dir = TempDir::new().unwrap();
    assert!(goseal(dir.path(), &["init"]).status.success());
    assert!(dir.path().join(".goseal.yml").is_file());
    assert!(!goseal(dir.path(), &["init"]).status.success());
    assert!(goseal(dir.path(), &["init", "--force"]).status.success());
}

#[test]
fn list_rules_names_every_code() {
    let dir = TempDir::new().unwrap();
    let out = goseal(dir.path(), &["list-rules"]);
    let stdout = String::from_utf8(out.stdout).unwrap();
    for code in ["GS001", "GS002", "GS003", "GS004"] {
        assert!(stdout.contains(code));
    }
}
