//! Integration tests for the configlint binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, path: &str, contents: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Base `{a: 1, b: 2}`, installation `gauss` with the given override, and
/// app `foo` reading both values.
fn setup_repo(patch: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "default/config.yaml", "a: 1\nb: 2\n");
    write(
        root,
        "default/apps/foo/configmap-values.yaml.template",
        "a: {{ .a }}\nb: {{ .b | default \"x\" }}\n",
    );
    write(root, "installations/gauss/config.yaml.patch", patch);
    write(root, "installations/gauss/secret.yaml", "");
    temp
}

fn configlint(root: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("configlint"));
    cmd.arg("--root").arg(root).arg("--no-color");
    cmd.env_remove("CONFIGLINT_ROOT");
    cmd
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("configlint"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Cross-reference linter"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("configlint"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn lint_reports_duplicate_and_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_repo("a: 1\nb: 99\n");
    configlint(temp.path())
        .arg("lint")
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "installations/gauss/config.yaml.patch: .a is a duplicate of the same path in default/config.yaml [duplicate-config-value]",
        ))
        .stdout(predicate::str::contains("Found 3 issue(s)"));
    Ok(())
}

#[test]
fn lint_is_the_default_command() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_repo("a: 1\nb: 99\n");
    configlint(temp.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("duplicate-config-value"));
    Ok(())
}

#[test]
fn suggestions_alone_pass() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_repo("b: 99\n");
    configlint(temp.path())
        .arg("lint")
        .assert()
        .success()
        .stdout(predicate::str::contains("is used by just one app: foo"));
    Ok(())
}

#[test]
fn strict_fails_on_suggestions() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_repo("b: 99\n");
    configlint(temp.path())
        .args(["lint", "--strict"])
        .assert()
        .code(1);
    Ok(())
}

#[test]
fn only_errors_and_hidden_details() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_repo("a: 1\nb: 99\n");
    configlint(temp.path())
        .args(["lint", "--only-errors", "--no-descriptions", "--no-rule-names"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Found 1 issue(s)"))
        .stdout(predicate::str::contains("[duplicate-config-value]").not())
        .stdout(predicate::str::contains("just one app").not());
    Ok(())
}

#[test]
fn max_messages_truncates() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_repo("a: 1\nb: 99\n");
    configlint(temp.path())
        .args(["lint", "--max-messages", "1"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("2 more message(s) not shown"));
    Ok(())
}

#[test]
fn json_output() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_repo("a: 1\nb: 99\n");
    let output = configlint(temp.path())
        .args(["lint", "--format", "json"])
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(parsed["summary"]["total"], 3);
    assert_eq!(parsed["summary"]["errors"], 1);
    assert_eq!(parsed["summary"]["suggestions"], 2);
    assert_eq!(parsed["diagnostics"][0]["rule_id"], "duplicate-config-value");
    Ok(())
}

#[test]
fn filter_selects_rules() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_repo("a: 1\nb: 99\n");
    configlint(temp.path())
        .args(["lint", "--filter", "^unused-"])
        .assert()
        .success()
        .stdout(predicate::str::contains("duplicate-config-value").not());
    Ok(())
}

#[test]
fn invalid_filter_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_repo("{}\n");
    configlint(temp.path())
        .args(["lint", "--filter", "("])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid rule filter"));
    Ok(())
}

#[test]
fn missing_repository_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    configlint(temp.path())
        .arg("lint")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("default/config.yaml"));
    Ok(())
}

#[test]
fn malformed_yaml_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_repo("a: [1\n");
    configlint(temp.path())
        .arg("lint")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("installations/gauss/config.yaml.patch"));
    Ok(())
}

#[test]
fn settings_file_is_honoured() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_repo("a: 1\nb: 99\n");
    write(
        temp.path(),
        ".configlint.yaml",
        "disabled_rules: [duplicate-config-value]\n",
    );
    configlint(temp.path()).arg("lint").assert().success();
    Ok(())
}

#[test]
fn invalid_settings_exit_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_repo("{}\n");
    write(temp.path(), ".configlint.yaml", "unknown_key: 1\n");
    configlint(temp.path())
        .arg("lint")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid settings"));
    Ok(())
}

#[test]
fn root_from_environment() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_repo("a: 1\nb: 99\n");
    let mut cmd = Command::new(cargo_bin("configlint"));
    cmd.env("CONFIGLINT_ROOT", temp.path())
        .args(["lint", "--no-color"])
        .assert()
        .code(1);
    Ok(())
}

#[test]
fn rules_lists_builtins() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("configlint"));
    cmd.arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("overshadowed-config-value"))
        .stdout(predicate::str::contains("missing-include"));
    Ok(())
}

#[test]
fn completions_generate() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("configlint"));
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("configlint"));
    Ok(())
}
