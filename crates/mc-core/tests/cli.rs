//! CLI tests for mc-core: output formats, error payloads and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// mc-core with inputs discovery pinned to an empty sandbox.
fn mc_core(sandbox: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mc-core").expect("mc-core binary should exist");
    cmd.env_remove("MARKOV_CALIBRATE_INPUTS")
        .env_remove("MC_LOG")
        .env_remove("RUST_LOG")
        .env("MARKOV_CALIBRATE_CONFIG_DIR", sandbox)
        .env("XDG_CONFIG_HOME", sandbox)
        .env("NO_COLOR", "1");
    cmd
}

fn write_inputs(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("clinical.json");
    fs::write(&path, body).expect("write inputs");
    path
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

// ============================================================================
// Happy paths
// ============================================================================

mod happy_paths {
    use super::*;

    #[test]
    fn version_is_json_by_default() {
        let sandbox = TempDir::new().unwrap();
        let output = mc_core(sandbox.path()).arg("version").output().unwrap();
        assert!(output.status.success());
        let json = stdout_json(&output);
        assert_eq!(json["schema_version"], "1.0.0");
        assert!(json["mc_core_version"].is_string());
    }

    #[test]
    fn calibrate_defaults_reports_both_arms() {
        let sandbox = TempDir::new().unwrap();
        let output = mc_core(sandbox.path())
            .args(["-q", "calibrate"])
            .output()
            .unwrap();
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        let json = stdout_json(&output);
        assert_eq!(json["arms"].as_array().unwrap().len(), 2);
        assert!(json["run_id"].as_str().unwrap().starts_with("run-"));
        assert_eq!(json["config"]["inputs_source"], "builtin default");
    }

    #[test]
    fn single_arm_summary() {
        let sandbox = TempDir::new().unwrap();
        mc_core(sandbox.path())
            .args(["-q", "calibrate", "--therapy", "anticoagulation", "-f", "summary"])
            .assert()
            .success()
            .stdout(predicate::str::contains("calibrated 1 arm(s) [anticoagulation]"));
    }

    #[test]
    fn calibrate_markdown_from_explicit_file() {
        let sandbox = TempDir::new().unwrap();
        let path = write_inputs(
            &sandbox,
            r#"{"schema_version": "1.0.0", "cohort": {"delta_t": 0.25}}"#,
        );
        mc_core(sandbox.path())
            .args(["-q", "calibrate", "-f", "md", "--inputs"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("# Calibration Report"))
            .stdout(predicate::str::contains("time step: 0.250000 years"));
    }

    #[test]
    fn inputs_are_found_in_config_dir() {
        let sandbox = TempDir::new().unwrap();
        write_inputs(&sandbox, r#"{"schema_version": "1.0.0"}"#);
        let output = mc_core(sandbox.path()).args(["-q", "check"]).output().unwrap();
        assert!(output.status.success());
        let json = stdout_json(&output);
        assert_eq!(json["valid"], true);
        assert_eq!(json["snapshot"]["inputs_source"], "environment variable");
    }

    #[test]
    fn rates_markdown_lists_transitions() {
        let sandbox = TempDir::new().unwrap();
        mc_core(sandbox.path())
            .args(["-q", "rates", "-f", "md"])
            .assert()
            .success()
            .stdout(predicate::str::contains("| Stroke | PostStroke | 52.000000 |"));
    }

    #[test]
    fn schema_describes_inputs() {
        let sandbox = TempDir::new().unwrap();
        mc_core(sandbox.path())
            .arg("schema")
            .assert()
            .success()
            .stdout(predicate::str::contains("schema_version"))
            .stdout(predicate::str::contains("background_mortality"));
    }

    #[test]
    fn json_logs_go_to_stderr() {
        let sandbox = TempDir::new().unwrap();
        let output = mc_core(sandbox.path())
            .args(["--log-format", "json", "calibrate", "-f", "summary"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        let first = stderr.lines().next().expect("at least one log line");
        let line: serde_json::Value = serde_json::from_str(first).unwrap();
        assert!(line.get("level").is_some());
        assert!(String::from_utf8_lossy(&output.stdout).starts_with("calibrated"));
    }
}

// ============================================================================
// Errors and exit codes
// ============================================================================

mod errors {
    use super::*;

    #[test]
    fn unknown_command_is_an_argument_error() {
        let sandbox = TempDir::new().unwrap();
        mc_core(sandbox.path())
            .arg("nonexistent-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn unknown_therapy_is_rejected() {
        let sandbox = TempDir::new().unwrap();
        mc_core(sandbox.path())
            .args(["calibrate", "--therapy", "aspirin"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("aspirin"));
    }

    #[test]
    fn missing_inputs_file_exits_with_config_error() {
        let sandbox = TempDir::new().unwrap();
        let output = mc_core(sandbox.path())
            .args(["-q", "calibrate", "--inputs"])
            .arg(sandbox.path().join("missing.json"))
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(11));
        let json = stdout_json(&output);
        assert_eq!(json["code"], 10);
        assert_eq!(json["category"], "config");
        assert_eq!(json["context"]["exit_code"], "ERR_CONFIG");
    }

    #[test]
    fn malformed_inputs_exit_with_config_error() {
        let sandbox = TempDir::new().unwrap();
        let path = write_inputs(&sandbox, "{ not json");
        mc_core(sandbox.path())
            .args(["-q", "check", "--inputs"])
            .arg(&path)
            .assert()
            .code(11)
            .stdout(predicate::str::contains("\"code\": 12"));
    }

    #[test]
    fn invalid_value_is_explained_for_humans() {
        let sandbox = TempDir::new().unwrap();
        let path = write_inputs(
            &sandbox,
            r#"{"schema_version": "1.0.0", "cohort": {"discount_rate": 1.5}}"#,
        );
        mc_core(sandbox.path())
            .args(["-q", "check", "-f", "summary", "--inputs"])
            .arg(&path)
            .assert()
            .code(11)
            .stderr(predicate::str::contains("Invalid Clinical Inputs"))
            .stderr(predicate::str::contains("discount_rate"))
            .stderr(predicate::str::contains("Fix:"));
    }

    #[test]
    fn baseline_without_real_generator_exits_with_calibration_error() {
        let sandbox = TempDir::new().unwrap();
        let path = write_inputs(
            &sandbox,
            r#"{
              "schema_version": "1.0.0",
              "baseline": {
                "transition_matrix": [
                  [0.1, 0.9, 0.0, 0.0, 0.0],
                  [0.0, 0.1, 0.9, 0.0, 0.0],
                  [0.9, 0.0, 0.1, 0.0, 0.0],
                  [0.0, 0.0, 0.0, 1.0, 0.0],
                  [0.0, 0.0, 0.0, 0.0, 1.0]
                ]
              }
            }"#,
        );
        let output = mc_core(sandbox.path())
            .args(["-q", "calibrate", "--inputs"])
            .arg(&path)
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(12));
        let json = stdout_json(&output);
        assert_eq!(json["code"], 32);
        assert_eq!(json["category"], "calibration");
        assert_eq!(json["recoverable"], false);
    }
}
