// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::fs;
use std::process::{Command, Output};

use tempfile::tempdir;

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_st-hybrid"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout_of(args: &[&str]) -> String {
    let output = run_cli(args);
    assert!(
        output.status.success(),
        "st-hybrid {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn call_simpleop_prints_diagnostics_then_result() {
    let stdout = stdout_of(&["call", "simpleop", "2.5"]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec!["Start hybrid op", "2.5", "Op return value:", "5.0"]
    );
}

#[test]
fn call_opwithglobal_uses_bound_value() {
    let stdout = stdout_of(&["--json", "call", "opwithglobal", "5", "--global", "10"]);
    assert_eq!(stdout.lines().last(), Some("15"));
    assert!(stdout.starts_with("Start hybrid op\n10\n5\n"));
}

#[test]
fn call_opwithglobal_without_binding_fails() {
    let output = run_cli(&["call", "opwithglobal", "5"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("globalval"), "stderr: {stderr}");
}

#[test]
fn call_rejects_non_numeric_operand() {
    let output = run_cli(&["call", "simpleop", "\"abc\""]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported operand"), "stderr: {stderr}");
}

#[test]
fn hybrid_reads_config_layers_and_flags() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("base.toml"),
        "[hybrid]\niterations = 3\nfast_step_ms = 0\nop_latency_ms = 0\nwidth = 2\n",
    )
    .unwrap();

    let root = dir.path().to_str().unwrap();
    let stdout = stdout_of(&["--config-root", root, "--json", "hybrid", "--op", "simpleop"]);
    let summary: serde_json::Value =
        serde_json::from_str(stdout.lines().last().unwrap()).unwrap();
    let launched = summary["launched"].as_array().unwrap().len();
    let busy = summary["busy"].as_array().unwrap().len();
    assert_eq!(launched + busy, 3);
    assert_eq!(summary["outputs"][0][0], 0);
    assert_eq!(summary["outputs"][0][1]["data"], serde_json::json!([0.0, 2.0]));
}

#[test]
fn smoke_prints_random_tensor() {
    let stdout = stdout_of(&["smoke", "--seed", "1"]);
    assert!(stdout.starts_with("Starting test.\nRandom 2x3 tensor:\n[["));
}

#[test]
fn list_names_both_ops() {
    let stdout = stdout_of(&["--json", "list"]);
    assert_eq!(stdout.trim(), r#"["opwithglobal","simpleop"]"#);
}
