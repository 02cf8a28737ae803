//! Exit codes and output of the `nuresolve` binary.

use crate::common::TestProject;
use predicates::prelude::*;

const METADATA: &str = "    <version>1.0.0</version>\n    <description>Core types</description>";

#[test]
fn test_resolve_success_json() {
    let project = TestProject::new().unwrap();
    project.add_package("A", "1.0.0", &[("B", "[2.0.0, 3.0.0)")]);
    project.add_package("A", "1.2.0", &[("B", "[2.0.0, 3.0.0)")]);
    project.add_package("B", "2.5.0", &[]);
    project.add_package("B", "2.9.0", &[]);
    project.write_request(&[("A", ">= 1.0.0"), ("B", "2.5.0")]);

    let output = project
        .run_nuresolve(&["resolve", "project.toml", "--feed", "feed", "--format", "json"])
        .unwrap();
    output.assert_success();

    let json = output.json();
    assert_eq!(json["success"], true);
    let framework = &json["frameworks"][0];
    assert_eq!(framework["framework"], "net6.0");
    assert_eq!(framework["outcome"], "success");
    let packages = framework["packages"].as_array().unwrap();
    let version_of = |id: &str| {
        packages
            .iter()
            .find(|p| p["id"] == id)
            .map(|p| p["version"].as_str().unwrap().to_string())
    };
    assert_eq!(version_of("A").as_deref(), Some("1.2.0"));
    assert_eq!(version_of("B").as_deref(), Some("2.5.0"));
    assert_eq!(framework["install_order"][0], "B 2.5.0");
}

#[test]
fn test_resolve_conflict_exit_code() {
    let project = TestProject::new().unwrap();
    project.add_package("A", "1.0.0", &[("X", "[1.0, 2.0)")]);
    project.add_package("B", "1.0.0", &[("X", "[3.0, 4.0)")]);
    project.add_package("X", "1.5.0", &[]);
    project.add_package("X", "3.5.0", &[]);
    project.write_request(&[("A", "[1.0.0, )"), ("B", "[1.0.0, )")]);

    let output = project.run_nuresolve(&["resolve", "project.toml", "--feed", "feed"]).unwrap();
    output.assert_code(2);
    assert!(output.stdout.contains("NU1107"));
    assert!(output.stdout.contains("partial"));
}

#[test]
fn test_resolve_tree_shows_cycle() {
    let project = TestProject::new().unwrap();
    project.add_package("A", "1.0.0", &[("B", "[1.0.0, )")]);
    project.add_package("B", "1.0.0", &[("A", "[1.0.0, )")]);
    project.write_request(&[("A", "[1.0.0, )")]);

    let output = project
        .run_nuresolve(&["resolve", "project.toml", "--feed", "feed", "--tree"])
        .unwrap();
    output.assert_success();
    assert!(output.stdout.contains("(circular reference)"));
    assert!(output.stdout.contains("A -> B -> A"));
}

#[test]
fn test_resolve_missing_request_is_hard_failure() {
    let project = TestProject::new().unwrap();
    let output = project.run_nuresolve(&["resolve", "missing.toml", "--feed", "feed"]).unwrap();
    output.assert_code(1);
    assert!(output.stderr.contains("error"));
}

#[test]
fn test_validate_reports_assembly_outside_lib() {
    let project = TestProject::new().unwrap();
    let dir = project.add_package_dir("Contoso.Core", METADATA, &["tools/foo.dll"]);

    let output = project
        .run_nuresolve(&["validate", dir.to_str().unwrap(), "--format", "json"])
        .unwrap();
    output.assert_success();
    let json = output.json();
    let messages = json.as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["code"], "NU5100");
    assert!(messages[0]["message"].as_str().unwrap().contains("tools/foo.dll"));
}

#[test]
fn test_validate_with_promoted_warning() {
    let project = TestProject::new().unwrap();
    let dir = project.add_package_dir("Contoso.Core", METADATA, &["tools/foo.dll"]);
    let config = project.root().join("nuresolve.toml");
    std::fs::write(&config, "[rules]\nwarnings_as_errors = [\"NU5100\"]\n").unwrap();

    let output = project
        .run_nuresolve(&["--config", config.to_str().unwrap(), "validate", dir.to_str().unwrap()])
        .unwrap();
    output.assert_code(2);
    assert!(output.stdout.contains("NU5100"));
}

#[test]
fn test_nearest() {
    let project = TestProject::new().unwrap();
    let output = project
        .run_nuresolve(&["nearest", "net6.0", "net472", "netstandard2.0", "netstandard1.3"])
        .unwrap();
    output.assert_success();
    assert_eq!(output.stdout.trim(), "netstandard2.0");

    let output = project.run_nuresolve(&["nearest", "net472", "net6.0"]).unwrap();
    output.assert_code(2);
}

#[test]
fn test_nearest_invalid_moniker_suggests() {
    let project = TestProject::new().unwrap();
    let output = project.run_nuresolve(&["nearest", "netstandrd2.0", "net6.0"]).unwrap();
    output.assert_code(1);
    assert!(output.stderr.contains("suggestion"));
}

#[test]
fn test_verbose_logs_to_stderr() {
    let project = TestProject::new().unwrap();
    project.add_package("A", "1.0.0", &[]);
    project.write_request(&[("A", "1.0.0")]);

    project
        .command()
        .unwrap()
        .args(["--verbose", "resolve", "project.toml", "--feed", "feed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("A 1.0.0 (direct)"))
        .stderr(predicate::str::contains("DEBUG"));
}

#[test]
fn test_quiet_validate_prints_only_findings() {
    let project = TestProject::new().unwrap();
    let dir = project.add_package_dir("Contoso.Core", METADATA, &["lib/net6.0/Contoso.Core.dll"]);

    project
        .command()
        .unwrap()
        .args(["--quiet", "validate"])
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
