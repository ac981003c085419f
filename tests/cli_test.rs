//! CLI smoke tests against the compiled binary.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLE: &str = "1\n00:00:01,319 --> 00:00:02,800\nAlaniso saluda a todos\n\n\
                      2\n00:00:03,000 --> 00:00:05,500\nel amor es el camino\n";

fn testigo() -> Command {
    Command::cargo_bin("testigo").expect("binary builds")
}

#[test]
fn test_help() {
    testigo()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("query"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_status_on_empty_dir() {
    let tmp = TempDir::new().expect("temp dir");
    testigo()
        .args(["--index-dir"])
        .arg(tmp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("ausente"));
}

#[test]
fn test_ingest_skip_dense_and_status() {
    let tmp = TempDir::new().expect("temp dir");
    let corpus = tmp.path().join("corpus");
    std::fs::create_dir(&corpus).expect("create corpus dir");
    std::fs::write(corpus.join("charla.srt"), SAMPLE).expect("write srt");
    let index_dir = tmp.path().join("idx");

    testigo()
        .args(["--index-dir"])
        .arg(&index_dir)
        .arg("ingest")
        .arg(&corpus)
        .arg("--skip-dense")
        .assert()
        .success()
        .stdout(predicate::str::contains("Archivos procesados: 1"));

    testigo()
        .args(["--index-dir"])
        .arg(&index_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("disponible"));
}

#[test]
fn test_query_without_credentials_fails() {
    let tmp = TempDir::new().expect("temp dir");
    testigo()
        .env_remove("TESTIGO_API_KEY")
        .args(["--index-dir"])
        .arg(tmp.path())
        .arg("query")
        .arg("¿Quién es Alaniso?")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TESTIGO_API_KEY"));
}

#[test]
fn test_ingest_missing_corpus_fails_json() {
    let tmp = TempDir::new().expect("temp dir");
    testigo()
        .args(["--index-dir"])
        .arg(tmp.path())
        .args(["--format", "json", "ingest"])
        .arg(tmp.path().join("no-such-corpus"))
        .arg("--skip-dense")
        .assert()
        .failure()
        .stdout(predicate::str::contains("malformed_corpus_entry"));
}
