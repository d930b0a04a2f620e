//! Command line tests.
//!
//! These cover everything the binary checks before talking to Xcode, so they
//! run on any host.

use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn simforge_cmd() -> Command {
    let mut cmd = Command::cargo_bin("simforge").unwrap();
    cmd.env_remove("SIMFORGE_CONVERTER");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_options() {
    simforge_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deploy .app bundles"))
        .stdout(predicate::str::contains("--identity"))
        .stdout(predicate::str::contains("--device"))
        .stdout(predicate::str::contains("--boot-timeout"));
}

#[test]
fn package_argument_is_required() {
    simforge_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("<PACKAGE>"));
}

#[test]
fn missing_package_fails() {
    let temp = tempfile::tempdir().unwrap();

    simforge_cmd()
        .current_dir(temp.path())
        .arg("Demo.app")
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Error: "))
        .stderr(predicate::str::contains("Path does not exist"));
}

#[test]
fn unknown_package_type_fails() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join("Demo.zip"), b"PK").unwrap();

    simforge_cmd()
        .current_dir(temp.path())
        .arg("Demo.zip")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("neither a .app bundle nor an .ipa archive"));
}

#[test]
fn missing_converter_fails_before_discovery() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::create_dir(temp.path().join("Demo.app")).unwrap();

    simforge_cmd()
        .current_dir(temp.path())
        .args(["Demo.app", "--converter", "tools/simforge"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("conversion tool not found"))
        .stderr(predicate::str::contains("swift build -c release"));

    assert!(!temp.path().join(".simforge_config").exists());
}

#[test]
fn zero_boot_timeout_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::create_dir(temp.path().join("Demo.app")).unwrap();

    simforge_cmd()
        .current_dir(temp.path())
        .args(["Demo.app", "--boot-timeout", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--boot-timeout must be at least 1 second"));
}

#[test]
fn remember_without_device_is_a_usage_error() {
    simforge_cmd()
        .args(["Demo.app", "--remember"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--device"));
}
