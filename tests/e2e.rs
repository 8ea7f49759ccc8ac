//! End-to-end tests that invoke the compiled `changelog-normalize` binary as a subprocess.
//!
//! These tests exercise CLI argument parsing, config loading, output file
//! generation, and exit codes.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Locate the compiled binary built by `cargo test`.
fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_changelog-normalize"))
}

/// Run the binary with the given arguments, returning the full Output.
fn run_cli(args: &[&str]) -> Output {
    Command::new(binary_path())
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("failed to execute changelog-normalize binary")
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

const CHANGELOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<databaseChangeLog xmlns="http://www.liquibase.org/xml/ns/dbchangelog">
    <changeSet author="dev">
        <createIndex tableName="users">
            <column name="email"/>
        </createIndex>
    </changeSet>
</databaseChangeLog>"#;

#[test]
fn test_exit_0_and_outputs_written() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    std::fs::create_dir(&input).expect("mkdir");
    std::fs::write(input.join("V1.xml"), CHANGELOG).expect("write");
    std::fs::write(input.join("V2.xml"), CHANGELOG).expect("write");

    let result = run_cli(&["--input", &path_arg(&input), "--output", &path_arg(&output)]);

    assert_eq!(
        result.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    let v1 = std::fs::read_to_string(output.join("V1.xml")).expect("V1 written");
    let v2 = std::fs::read_to_string(output.join("V2.xml")).expect("V2 written");
    assert!(v1.contains(r#"<changeSet author="dev" id="V1_1">"#), "{}", v1);
    assert!(v1.contains(r#"indexName="index__2""#), "{}", v1);
    assert!(v2.contains(r#"indexName="index__3""#), "{}", v2);

    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("2 file(s)"), "stderr: {}", stderr);
}

#[test]
fn test_exit_2_on_parse_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = tmp.path().join("in");
    std::fs::create_dir(&input).expect("mkdir");
    std::fs::write(input.join("broken.xml"), "<databaseChangeLog><changeSet>").expect("write");

    let result = run_cli(&[
        "--input",
        &path_arg(&input),
        "--output",
        &path_arg(&tmp.path().join("out")),
    ]);

    assert_eq!(result.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("broken.xml"), "stderr: {}", stderr);
}

#[test]
fn test_exit_2_on_missing_input_dir() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let result = run_cli(&[
        "--input",
        &path_arg(&tmp.path().join("nope")),
        "--output",
        &path_arg(&tmp.path().join("out")),
    ]);
    assert_eq!(result.status.code(), Some(2));
}

#[test]
fn test_exit_2_on_missing_config() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let result = run_cli(&[
        "--input",
        &path_arg(tmp.path()),
        "--output",
        &path_arg(&tmp.path().join("out")),
        "--config",
        &path_arg(&tmp.path().join("absent.toml")),
    ]);
    assert_eq!(result.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Config file not found"), "stderr: {}", stderr);
}

#[test]
fn test_config_file_changes_prefixes() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    std::fs::create_dir(&input).expect("mkdir");
    std::fs::write(input.join("001.xml"), CHANGELOG).expect("write");
    let config = tmp.path().join("changelog-normalize.toml");
    std::fs::write(&config, "[naming]\nindex_prefix = \"idx\"\n").expect("write config");

    let result = run_cli(&[
        "--input",
        &path_arg(&input),
        "--output",
        &path_arg(&output),
        "--config",
        &path_arg(&config),
    ]);

    assert_eq!(result.status.code(), Some(0));
    let text = std::fs::read_to_string(output.join("001.xml")).expect("written");
    assert!(text.contains(r#"indexName="idx_2""#), "{}", text);
}

#[test]
fn test_missing_required_flag_is_usage_error() {
    let result = run_cli(&["--input", "somewhere"]);
    assert_ne!(result.status.code(), Some(0));
}
