//! CLI end-to-end tests
//!
//! Runs the mediatranscript binary for commands that need no external tools
//! or network access.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the mediatranscript binary
#[allow(deprecated)]
fn mediatranscript_cmd() -> Command {
    let mut cmd = Command::cargo_bin("mediatranscript").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("OPENAI_API_KEY")
        .env_remove("OPENAI_BASE_URL")
        .env_remove("OPENAI_MODEL")
        .env_remove("MEDIATRANSCRIPT_OUTPUT_DIR");
    cmd
}

#[test]
fn test_cli_no_args_shows_help() {
    mediatranscript_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    mediatranscript_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mediatranscript"));
}

#[test]
fn test_cli_process_help() {
    mediatranscript_cmd()
        .args(["process", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Run one media file"));
}

#[test]
fn test_cli_validate_defaults() {
    mediatranscript_cmd()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"))
        .stdout(predicate::str::contains("0.0.0.0:5000"));
}

#[test]
fn test_cli_validate_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{ "server": { "port": 8088 }, "summary": { "model": "gpt-4.1-mini" } }"#,
    )
    .unwrap();

    mediatranscript_cmd()
        .arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains(":8088"))
        .stdout(predicate::str::contains("gpt-4.1-mini"));
}

#[test]
fn test_cli_validate_rejects_bad_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    mediatranscript_cmd()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("config parse error"));
}

#[test]
fn test_cli_report_writes_pdf_with_normalized_suffix() {
    let dir = tempdir().unwrap();
    let transcript = dir.path().join("transcript.txt");
    let summary = dir.path().join("summary.txt");
    fs::write(&transcript, "First line.\n\nSecond line.").unwrap();
    fs::write(&summary, "Short summary.").unwrap();

    mediatranscript_cmd()
        .arg("report")
        .arg("--transcript")
        .arg(&transcript)
        .arg("--summary")
        .arg(&summary)
        .arg("--output")
        .arg(dir.path().join("out").join("meeting.txt"))
        .args(["--format", "pdf"])
        .assert()
        .success()
        .stdout(predicate::str::contains("meeting.pdf"));

    let bytes = fs::read(dir.path().join("out").join("meeting.pdf")).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn test_cli_report_rejects_unknown_format() {
    let dir = tempdir().unwrap();
    let text = dir.path().join("t.txt");
    fs::write(&text, "x").unwrap();

    mediatranscript_cmd()
        .arg("report")
        .arg("--transcript")
        .arg(&text)
        .arg("--summary")
        .arg(&text)
        .arg("--output")
        .arg(dir.path().join("r"))
        .args(["--format", "odt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported report format"));
}

#[test]
fn test_cli_process_rejects_unsupported_extension() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("song.ogg");
    fs::write(&input, b"OggS").unwrap();
    let outputs = dir.path().join("outputs");

    mediatranscript_cmd()
        .arg("process")
        .arg(&input)
        .args(["--api-key", "sk-test"])
        .arg("--output-dir")
        .arg(&outputs)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported"));

    assert_eq!(fs::read_dir(&outputs).unwrap().count(), 0);
}

#[test]
fn test_cli_summarize_requires_api_key() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("t.txt");
    fs::write(&input, "hello").unwrap();

    mediatranscript_cmd()
        .arg("summarize")
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(dir.path().join("s.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}
