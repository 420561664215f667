//! Integration tests for the CLI interface
//!
//! Runs the built binary and checks stdout carries exactly the result line.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn parsum() -> Command {
    let mut cmd = Command::cargo_bin("parsum").unwrap();
    cmd.env_remove("PARSUM_ITERATIONS")
        .env_remove("PARSUM_WORKERS")
        .env_remove("PARSUM_COORDINATOR")
        .env_remove("RUST_LOG");
    cmd
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_zeta_two_prints_one_result_line() {
    parsum()
        .args(["-n", "2", "-i", "1000", "-w", "3"])
        .assert()
        .success()
        .stdout(
            predicate::str::is_match(
                r"^HDF5:\{'name':'z','value':1\.6439\d{12}e\+00,'desc':'zeta'\}:5FDH\n$",
            )
            .unwrap(),
        );
}

#[test]
fn test_logs_stay_on_stderr() {
    parsum()
        .args(["-n", "2", "-i", "100", "-w", "2"])
        .assert()
        .success()
        .stderr(predicate::str::contains("running on"))
        .stderr(predicate::str::contains("zeta(2) = "))
        .stdout(predicate::str::contains("running on").not());
}

#[test]
fn test_missing_exponent_shows_usage() {
    parsum()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage:"))
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_invalid_exponent_rejected() {
    for bad in ["0", "abc", "2.5"] {
        parsum()
            .args(["-n", bad])
            .assert()
            .failure()
            .code(2)
            .stdout(predicate::str::is_empty());
    }
}

#[test]
fn test_config_file_sets_iterations() {
    let file = config_file("iterations = 11\nworkers = 4\n");

    parsum()
        .args(["-n", "1", "-c"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("'value':2.92896825396825"));
}

#[test]
fn test_environment_sets_iterations() {
    parsum()
        .args(["-n", "1", "-w", "2"])
        .env("PARSUM_ITERATIONS", "11")
        .env("PARSUM_WORKERS", "lots")
        .assert()
        .success()
        .stdout(predicate::str::contains("'value':2.92896825396825"));
}

#[test]
fn test_unknown_config_key_fails() {
    let file = config_file("iterations = 11\nthreads = 4\n");

    parsum()
        .args(["-n", "2", "-c"])
        .arg(file.path())
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Configuration problem"))
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_coordinator_out_of_range() {
    parsum()
        .args(["-n", "2", "-i", "100", "-w", "2", "--coordinator", "5"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("coordinator"))
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_more_workers_than_terms() {
    parsum()
        .args(["-n", "3", "-i", "1", "-w", "8"])
        .assert()
        .success()
        .stdout("HDF5:{'name':'z','value':0.0000000000000000e+00,'desc':'zeta'}:5FDH\n");
}
