//! Integration test: a small crate on disk, loaded and checked end to end.

use goseal_core::config::{self, ConfigFormat};
use goseal_core::Violation;
use goseal_engine::SealAnalyzer;
use goseal_syn::{lower_sources, CrateLoader, LoadedCrate, SourceText};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const LIB: &[&str] = &["pub mod app;", "pub mod domain;", "mod gen;"];

const DOMAIN: &[&str] = &[
    "pub struct User {",
    "    pub id: u64,",
    "    pub name: String,",
    "}",
    "",
    "pub struct Tag(pub String);",
    "",
    "impl User {",
    "    pub fn new(id: u64, name: String) -> Self {",
    "        Self { id, name }",
    "    }",
    "",
    "    pub fn rename(&mut self, name: String) {",
    "        let apply = |n: String| self.name = n;",
    "        apply(name);",
    "    }",
    "}",
    "",
    "pub fn reset(user: &mut User) {",
    "    user.name = String::new();",
    "}",
    "",
    "#[cfg(test)]",
    "mod tests {",
    "    use super::*;",
    "",
    "    fn fixture() -> User {",
    "        User { id: 9, name: String::new() }",
    "    }",
    "}",
];

const APP: &[&str] = &[
    "use crate::domain::{Tag, User};",
    "",
    "pub fn build() -> User {",
    "    let mut user = User { id: 1, name: \"a\".to_string() };",
    "    user.name = \"b\".to_string();",
    "    user",
    "}",
    "",
    "pub fn ok() -> User {",
    "    let tag = Tag(String::new());",
    "    User::new(2, tag.0)",
    "}",
];

const GENERATED: &[&str] = &[
    "// Code generated by build.rs. DO NOT EDIT.",
    "pub fn seed() -> crate::domain::User {",
    "    crate::domain::User { id: 0, name: String::new() }",
    "}",
];

fn write(dir: &Path, relative: &str, lines: &[&str]) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, lines.join("\n")).unwrap();
}

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/lib.rs", LIB);
    write(dir.path(), "src/domain.rs", DOMAIN);
    write(dir.path(), "src/app.rs", APP);
    write(dir.path(), "src/gen.rs", GENERATED);
    dir
}

fn check(loaded: &LoadedCrate, analyzer: &SealAnalyzer) -> Vec<Violation> {
    loaded
        .units
        .iter()
        .flat_map(|unit| analyzer.analyze(unit))
        .collect()
}

fn summary(violations: &[Violation]) -> Vec<String> {
    violations
        .iter()
        .map(|v| {
            format!(
                "{}:{}:{} {}",
                v.location.file.display(),
                v.location.line,
                v.location.column,
                v.code
            )
        })
        .collect()
}

#[test]
fn modules_become_units() {
    let dir = fixture();
    let loaded = CrateLoader::new(dir.path()).load().unwrap();
    let packages: Vec<_> = loaded.units.iter().map(|u| u.package.as_str()).collect();
    assert_eq!(
        packages,
        vec!["crate", "crate::app", "crate::domain", "crate::gen"]
    );
    assert!(loaded.failures.is_empty());
}

#[test]
fn default_policy_on_a_real_crate() {
    let dir = fixture();
    let loaded = CrateLoader::new(dir.path()).load().unwrap();
    let violations = check(&loaded, &SealAnalyzer::default());
    assert_eq!(
        summary(&violations),
        vec![
            "src/app.rs:4:20 GS001",
            "src/app.rs:5:5 GS003",
            "src/app.rs:10:15 GS001",
            "src/domain.rs:20:5 GS003",
        ]
    );
    insta::assert_snapshot!(violations[0].to_string(), @"src/app.rs:4:20: error [GS001] direct construction of sealed struct User is not allowed from outside its package (init-scope: same-package)");
    insta::assert_snapshot!(violations[3].to_string(), @"src/domain.rs:20:5: error [GS003] direct assignment to field name of sealed struct User is not allowed outside its receiver methods (mutation-scope: receiver)");
}

#[test]
fn factory_names_apply_to_rust_constructors() {
    let dir = fixture();
    let loaded = CrateLoader::new(dir.path()).load().unwrap();
    let config = config::parse_str(
        "factory-names: [\"^new$\"]\nmutation-scope: any\n",
        ConfigFormat::Yaml,
    )
    .unwrap();
    let violations = check(&loaded, &SealAnalyzer::new(config));
    // Inside domain only `new` may build. Outside it, scope is checked first.
    assert_eq!(
        summary(&violations),
        vec![
            "src/app.rs:4:20 GS001",
            "src/app.rs:10:15 GS001",
            "src/domain.rs:28:9 GS002",
        ]
    );
}

#[test]
fn excluded_files_are_not_loaded() {
    let dir = fixture();
    let loaded = CrateLoader::new(dir.path())
        .exclude("**/app.rs")
        .unwrap()
        .load()
        .unwrap();
    assert!(loaded.units.iter().all(|u| u.package != "crate::app"));
    assert_eq!(summary(&check(&loaded, &SealAnalyzer::default())).len(), 1);
}

#[test]
fn unparsable_files_are_reported_but_do_not_stop_the_load() {
    let dir = fixture();
    write(dir.path(), "src/broken.rs", &["pub fn broken( {"]);
    let loaded = CrateLoader::new(dir.path()).load().unwrap();
    assert_eq!(loaded.failures.len(), 1);
    assert!(loaded.failures[0].to_string().starts_with("parse error in src/broken.rs:1:"));
    assert_eq!(loaded.units.len(), 4);
}

#[test]
fn single_file_roots_are_supported() {
    let dir = fixture();
    let loaded = CrateLoader::new(dir.path().join("src/app.rs")).load().unwrap();
    assert_eq!(loaded.units.len(), 1);
    assert_eq!(loaded.units[0].package, "crate::app");
    assert_eq!(loaded.units[0].files[0].path, Path::new("app.rs"));
}

#[test]
fn patterns_in_foreign_code_are_not_constructions() {
    let domain = "pub struct User {\n    pub id: u64,\n}\n\npub struct Id(pub u64);\n";
    let app = [
        "use crate::domain::{Id, User};",
        "",
        "pub fn is_user(u: &User) -> bool { std::matches!(u, User { .. }) }",
        "pub fn is_core_user(u: &User) -> bool { core::matches!(u, User { id: 1 }) }",
        "",
        "pub fn unpack(u: User, id: Id) -> u64 {",
        "    let (a, b);",
        "    User { id: a } = u;",
        "    Id(b) = id;",
        "    a + b",
        "}",
    ]
    .join("\n");
    let loaded = lower_sources(&[
        SourceText::new("src/lib.rs", "crate", "pub mod app;\npub mod domain;\n"),
        SourceText::new("src/domain.rs", "crate::domain", domain),
        SourceText::new("src/app.rs", "crate::app", app),
    ]);
    assert!(loaded.failures.is_empty());
    assert!(summary(&check(&loaded, &SealAnalyzer::default())).is_empty());
}
