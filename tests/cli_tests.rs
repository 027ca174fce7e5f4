//! Integration tests for the binder CLI
//!
//! These tests run the actual binary and verify output.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn binder_cmd() -> Command {
    let mut cmd = Command::cargo_bin("binder").unwrap();
    cmd.env_remove("BINDER_APP_ID").env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_flag() {
    binder_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scoped name registry"));
}

#[test]
fn test_install_help() {
    binder_cmd()
        .args(["install", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--app-id"))
        .stdout(predicate::str::contains("--defer-app"));
}

// ============================================================================
// install
// ============================================================================

#[test]
fn test_install_defaults_with_app_id() {
    binder_cmd()
        .args(["install", "--app-id", "shop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("global/global-binding = Hello World!"))
        .stdout(predicate::str::contains(
            "app/shop/app-binding = Hello Application!",
        ));
}

#[test]
fn test_install_from_module_identifier() {
    binder_cmd()
        .args(["install", "--module", "deployment.jndi-example.war"])
        .assert()
        .success()
        .stdout(predicate::str::contains("'jndi-example'"))
        .stdout(predicate::str::contains("app/jndi-example/app-binding"));
}

#[test]
fn test_install_from_env() {
    binder_cmd()
        .env("BINDER_APP_ID", "from-env")
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("app/from-env/app-binding"));
}

#[test]
fn test_install_deferred_app_scope() {
    binder_cmd()
        .args(["install", "--app-id", "shop", "--defer-app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("app/shop app-binding [pending]"))
        .stdout(predicate::str::contains("1 binding(s) activated"))
        .stdout(predicate::str::contains("Hello Application!"));
}

#[test]
fn test_install_bad_module_fails() {
    binder_cmd()
        .args(["install", "--module", "shop.war"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("BIND-030"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_install_without_app_id_fails() {
    let temp_dir = TempDir::new().unwrap();
    binder_cmd()
        .current_dir(temp_dir.path())
        .arg("install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("BINDER_APP_ID is not set"));
}

#[test]
fn test_install_with_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("bindings.yaml");
    fs::write(
        &file,
        r#"
schema: binder/bindings@0.1
bindings:
  - name: env/motd
    scope: application
    value: Welcome aboard
  - name: version
    scope: global
    value: "1.2.3"
"#,
    )
    .unwrap();

    binder_cmd()
        .args(["install", "--app-id", "ship", "--config"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("global/version = 1.2.3"))
        .stdout(predicate::str::contains("app/ship/env/motd = Welcome aboard"));
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn test_validate_valid_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("bindings.yaml");
    fs::write(
        &file,
        "schema: binder/bindings@0.1\nbindings:\n  - { name: a, scope: global, value: x }\nstartup_timeout_ms: 500\n",
    )
    .unwrap();

    binder_cmd()
        .arg("validate")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"))
        .stdout(predicate::str::contains("Bindings: 1"))
        .stdout(predicate::str::contains("500ms"));
}

#[test]
fn test_validate_wrong_schema() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("bindings.yaml");
    fs::write(
        &file,
        "schema: other/schema@1\nbindings:\n  - { name: a, scope: global, value: x }\n",
    )
    .unwrap();

    binder_cmd()
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("BIND-001"));
}

#[test]
fn test_validate_missing_file() {
    binder_cmd()
        .args(["validate", "does-not-exist.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO error"));
}
