/* End-to-end tests of the wirebuf-gen binary */

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn run_with_stdin(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_wirebuf-gen"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn wirebuf-gen");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin)
        .expect("failed to write stdin");
    child.wait_with_output().expect("failed to wait for wirebuf-gen")
}

fn run(args: &[&str]) -> Output {
    run_with_stdin(args, b"")
}

#[test]
fn test_stdin_to_stdout_defaults_to_csharp() {
    let schema = std::fs::read(fixture("module1.json")).unwrap();
    let output = run_with_stdin(&[], &schema);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("using System;"));
    assert!(stdout.contains("MsgID_Ping = 0,"));
    assert!(stdout.contains("public void SendPingReq(PingReq pingReq) {"));
}

#[test]
fn test_malformed_stdin_fails_without_output() {
    let output = run_with_stdin(&[], b"{ \"package\": ");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("stdin"), "stderr was: {}", stderr);
}

#[test]
fn test_structural_error_fails_without_output() {
    let output = run(&["-f", fixture("broken.json").to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("A.xs"), "stderr was: {}", stderr);
}

#[test]
fn test_one_broken_file_suppresses_all_output() {
    let output = run(&[
        "-f",
        fixture("module1.json").to_str().unwrap(),
        "-f",
        fixture("broken.json").to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_rust_target_from_yaml_file() {
    let output = run(&["codegen", "-l", "rust", "-f", fixture("inventory.yaml").to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("pub mod inventory {"));
    assert!(stdout.contains("Load = 0,"));
    assert!(stdout.contains("Store = 1,"));
}

#[test]
fn test_output_directory_gets_one_file_per_package() {
    let dir = std::env::temp_dir().join(format!("wirebuf-gen-it-{}", std::process::id()));
    let output = run(&[
        "-l",
        "rust",
        "-o",
        dir.to_str().unwrap(),
        "-f",
        fixture("module1.json").to_str().unwrap(),
        "-f",
        fixture("inventory.yaml").to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(output.stdout.is_empty());

    let module1 = std::fs::read_to_string(dir.join("module1.rs")).unwrap();
    let inventory = std::fs::read_to_string(dir.join("inventory.rs")).unwrap();
    assert!(module1.contains("Ping = 0,"));
    assert!(inventory.contains("Load = 0,"));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_analyze_reports_ids_and_sizes() {
    let output = run(&["analyze", "-f", fixture("module1.json").to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Service ID: ServiceID_Module1"));
    assert!(stdout.contains("  0  Ping"));
    assert!(stdout.contains("[*] PingReq (Request, 4 bytes, 1 field(s))"));
    assert!(stdout.contains("[*] PingRsp (Response, 5 bytes, 2 field(s))"));
    assert!(stdout.contains("struct 'Module1' shares the package name"));

    /* Findings are also logged as warnings on stderr */
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("WARN"), "stderr was: {}", stderr);
}

#[test]
fn test_analyze_prints_layout_ir() {
    let file = fixture("module1.json");
    let output = run(&["analyze", "-f", file.to_str().unwrap(), "--print-ir"]);
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("\"strategy\": \"fixed\""));

    let output = run(&["analyze", "-f", file.to_str().unwrap(), "--print-ir", "--ir-format", "protobuf"]);
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("(hex-encoded bytes, IR schema v1)"));

    let output = run(&["analyze", "-f", file.to_str().unwrap(), "--print-codec-ir"]);
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("\"op\": \"write-scalar\""));
}
