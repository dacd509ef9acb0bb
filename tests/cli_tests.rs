//! Command-line tests for the stage-sequencer binary
//!
//! Each test runs the built binary in a scratch directory so no
//! stage-sequencer.toml from the checkout leaks in.

use assert_cmd::Command;
use predicates::prelude::*;

fn sequencer(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stage-sequencer").unwrap();
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_stages_lists_delivery_order() {
    let dir = tempfile::tempdir().unwrap();
    sequencer(&dir)
        .arg("stages")
        .assert()
        .success()
        .stdout(predicate::str::contains("📋 BASE STAGES (in order):"))
        .stdout(predicate::str::contains("1. overview"))
        .stdout(predicate::str::contains("7. code_guidelines"))
        .stdout(predicate::str::contains("→ unit_execution"))
        .stdout(predicate::str::contains("→ report"));
}

#[test]
fn test_show_substitutes_unit() {
    let dir = tempfile::tempdir().unwrap();
    sequencer(&dir)
        .args(["show", "unit_implementation", "--unit", "exp2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Implementation (exp2)"))
        .stdout(predicate::str::contains("{unit}").not());
}

#[test]
fn test_show_rejects_unknown_stage() {
    let dir = tempfile::tempdir().unwrap();
    sequencer(&dir)
        .args(["show", "step9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown stage 'step9'"));
}

#[test]
fn test_templates_file_from_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("templates.toml"),
        "report = \"Write the final summary.\"\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("stage-sequencer.toml"),
        "[workflow]\ntemplates_file = \"templates.toml\"\n",
    )
    .unwrap();

    sequencer(&dir)
        .args(["show", "report"])
        .assert()
        .success()
        .stdout("Write the final summary.\n");
}

#[test]
fn test_config_prints_effective_settings() {
    let dir = tempfile::tempdir().unwrap();
    sequencer(&dir)
        .arg("config")
        .env("STAGE_SEQUENCER__WORKFLOW__EMPTY_UNIT_POLICY", "vacuously_complete")
        .assert()
        .success()
        .stdout(predicate::str::contains("empty_unit_policy = \"vacuously_complete\""))
        .stdout(predicate::str::contains("log_level = \"info\""));
}

#[test]
fn test_serve_answers_on_stdout_only() {
    let dir = tempfile::tempdir().unwrap();
    let session = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05"}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"init","arguments":{}}}"#,
        "\n",
    );

    let output = sequencer(&dir)
        .arg("serve")
        .write_stdin(session)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["result"]["serverInfo"]["name"], "stage-sequencer");
    assert!(lines[1]["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .starts_with("You are reconstructing"));
}
