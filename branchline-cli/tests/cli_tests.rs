//! Integration tests for the Branchline CLI.
//!
//! These tests invoke the `branchline` binary as a subprocess and check
//! exit codes, stdout, and stderr.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(deprecated)]
fn branchline() -> Command {
    Command::cargo_bin("branchline").unwrap()
}

const SHOP: &str = r#"{
    "functions": [{ "name": "give", "params": ["number", "string"] }],
    "nodes": [
        { "name": "start", "body": [
            { "paragraph": [{ "literal": { "string": "Welcome" } }] },
            { "options": [
                { "text": "Buy", "target": "buy" },
                { "text": "Leave", "target": "bye" }
            ] }
        ] },
        { "name": "buy", "body": [
            { "code": [{ "call": { "name": "give", "args": [
                { "literal": { "number": 3 } },
                { "literal": { "string": "sword" } }
            ] } }] },
            { "link": { "text": "Thanks", "target": "bye" } }
        ] },
        { "name": "bye", "body": [
            { "paragraph": [{ "literal": { "string": "Farewell" } }] }
        ] }
    ]
}"#;

/// Jumps on a number, which faults at run time.
const FAULTY: &str = r#"{
    "nodes": [
        { "name": "start", "body": [
            { "code": [{ "if": { "cond": { "literal": { "number": 1 } } } }] }
        ] }
    ]
}"#;

/// Helper: write a script and compile it, returning the program path.
fn compile_to_temp(dir: &TempDir, json: &str) -> PathBuf {
    let input = dir.path().join("script.json");
    let output = dir.path().join("script.brl");
    fs::write(&input, json).unwrap();
    branchline()
        .args([
            "compile",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();
    output
}

// ---- No-args / help ----

#[test]
fn no_args_prints_usage_and_exits_1() {
    branchline()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Usage: branchline"));
}

#[test]
fn help_flag_exits_0() {
    branchline()
        .arg("--help")
        .assert()
        .success()
        .stderr(predicate::str::contains("Commands:"));
}

#[test]
fn unknown_command_exits_1() {
    branchline()
        .arg("frobnicate")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown command"));
}

// ---- Compile ----

#[test]
fn compile_reports_summary() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("shop.json");
    let output = dir.path().join("out.brl");
    fs::write(&input, SHOP).unwrap();

    branchline()
        .args([
            "compile",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("compiled 3 nodes"));

    let bytes = fs::read(&output).unwrap();
    assert_eq!(&bytes[..4], b"BRLN");
}

#[test]
fn compile_default_output_name() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("shop.json");
    fs::write(&input, SHOP).unwrap();

    branchline()
        .args(["compile", input.to_str().unwrap()])
        .assert()
        .success();

    assert!(dir.path().join("shop.brl").exists());
}

#[test]
fn compile_unresolved_target_exits_1() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.json");
    fs::write(
        &input,
        r#"{ "nodes": [{ "name": "a", "body": [{ "link": { "text": "go", "target": "nowhere" } }] }] }"#,
    )
    .unwrap();

    branchline()
        .args(["compile", input.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unresolved symbol 'nowhere'"));
    assert!(!dir.path().join("bad.brl").exists());
}

#[test]
fn compile_malformed_json_exits_1() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("broken.json");
    fs::write(&input, "{ \"nodes\": [").unwrap();

    branchline()
        .args(["compile", input.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid script"));
}

#[test]
fn compile_oversized_prototype_exits_1() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("wide.json");
    let params = vec!["\"number\""; 256].join(", ");
    fs::write(
        &input,
        format!(r#"{{ "functions": [{{ "name": "wide", "params": [{params}] }}], "nodes": [] }}"#),
    )
    .unwrap();

    branchline()
        .args(["compile", input.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "function 'wide' declares 256 parameters, at most 255 are encodable",
        ));
    assert!(!dir.path().join("wide.brl").exists());
}

#[test]
fn compile_missing_file_exits_1() {
    branchline()
        .args(["compile", "/nonexistent/script.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

// ---- Run ----

#[test]
fn run_leave_path() {
    let dir = TempDir::new().unwrap();
    let program = compile_to_temp(&dir, SHOP);

    branchline()
        .args(["run", program.to_str().unwrap()])
        .write_stdin("2\n")
        .assert()
        .success()
        .stdout("Welcome\n  1) Buy\n  2) Leave\nFarewell\n");
}

#[test]
fn run_buy_path_echoes_host_call() {
    let dir = TempDir::new().unwrap();
    let program = compile_to_temp(&dir, SHOP);

    branchline()
        .args(["run", program.to_str().unwrap()])
        .write_stdin("1\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Thanks\nFarewell\n"))
        .stderr(predicate::str::contains("call give(3, \"sword\")"));
}

#[test]
fn run_reprompts_on_invalid_choice() {
    let dir = TempDir::new().unwrap();
    let program = compile_to_temp(&dir, SHOP);

    branchline()
        .args(["run", program.to_str().unwrap()])
        .write_stdin("7\nleave\n2\n")
        .assert()
        .success()
        .stdout(predicate::str::ends_with("Farewell\n"))
        .stderr(predicate::str::contains("enter a number between 1 and 2"));
}

#[test]
fn run_without_choice_exits_1() {
    let dir = TempDir::new().unwrap();
    let program = compile_to_temp(&dir, SHOP);

    branchline()
        .args(["run", program.to_str().unwrap()])
        .write_stdin("")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("input ended"));
}

#[test]
fn run_runtime_fault_exits_3() {
    let dir = TempDir::new().unwrap();
    let program = compile_to_temp(&dir, FAULTY);

    branchline()
        .args(["run", program.to_str().unwrap()])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains(
            "runtime error: type mismatch at instruction 2: JMPF expects bool, found number",
        ));
}

#[test]
fn run_invalid_binary_exits_1() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("junk.brl");
    fs::write(&path, b"not a program").unwrap();

    branchline()
        .args(["run", path.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid binary: bad magic"));
}

// ---- Disassemble ----

#[test]
fn disassemble_lists_program() {
    let dir = TempDir::new().unwrap();
    let program = compile_to_temp(&dir, SHOP);

    branchline()
        .args(["disassemble", program.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(".func give(number, string)\n.start 0\n"))
        .stdout(predicate::str::contains("0000  NODE_ENTER start"))
        .stdout(predicate::str::contains("SHOW_CHOICES"));
}

// ---- Hash ----

#[test]
fn hash_is_stable_across_compiles() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let a = compile_to_temp(&first, SHOP);
    let b = compile_to_temp(&second, SHOP);

    let digest = |path: &PathBuf| {
        let out = branchline()
            .args(["hash", path.to_str().unwrap()])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let text = String::from_utf8(out).unwrap();
        text.split_whitespace().next().unwrap().to_string()
    };

    let ha = digest(&a);
    assert_eq!(ha.len(), 64);
    assert!(ha.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(ha, digest(&b));
}

#[test]
fn hash_missing_argument_exits_1() {
    branchline()
        .arg("hash")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("hash requires an input file"));
}
