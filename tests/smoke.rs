use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn prints_help() {
    let mut cmd = Command::cargo_bin("gridmate").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn bad_argument_fails() {
    let mut cmd = Command::cargo_bin("gridmate").unwrap();
    cmd.arg("--does-not-exist")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn serve_without_credential_fails_fast() {
    let mut cmd = Command::cargo_bin("gridmate").unwrap();
    cmd.arg("serve")
        .env_remove("OPENROUTER_API_KEY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENROUTER_API_KEY"));
}
