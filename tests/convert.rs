use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

const SAMPLE: &str = "name,age\na,3\nb,10\n";

#[test]
fn convert_round_trips_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.csv");
    fs::write(&input, SAMPLE).unwrap();

    let mut cmd = Command::cargo_bin("gridmate").unwrap();
    cmd.arg("convert")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::eq(SAMPLE));
}

#[test]
fn convert_emits_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.csv");
    fs::write(&input, SAMPLE).unwrap();

    let mut cmd = Command::cargo_bin("gridmate").unwrap();
    let output = cmd
        .arg("convert")
        .arg(&input)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["age"], "10");
}

#[test]
fn convert_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.csv");
    let output = dir.path().join("out.csv");
    fs::write(&input, SAMPLE).unwrap();

    let mut cmd = Command::cargo_bin("gridmate").unwrap();
    cmd.arg("convert")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&output).unwrap(), SAMPLE);
}

#[test]
fn convert_rejects_malformed_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ragged.csv");
    fs::write(&input, "name,age\na,3,extra\n").unwrap();

    let mut cmd = Command::cargo_bin("gridmate").unwrap();
    cmd.arg("convert")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed CSV input"));
}
