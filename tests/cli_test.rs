use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const ECHO_TOOL: &str = r#"#!/usr/bin/env cwl-runner

cwlVersion: v1.0
class: CommandLineTool

baseCommand: echo

inputs:
  message:
    type: string
    inputBinding:
      position: 1
  verbose:
    type: boolean
    default: false
    inputBinding:
      prefix: --verbose

outputs:
  out:
    type: stdout


stdout: out.txt
"#;

const SCATTER_WORKFLOW: &str = r#"#!/usr/bin/env cwl-runner

cwlVersion: v1.0
class: Workflow

inputs:
  message:
    type: string

outputs:
  result:
    type: string
    outputSource: say/out

steps:
  say:
    id: say
    run: echo_tool.cwl
    in:
      - id: message
        source: message
    out: [out]
"#;

#[test]
fn test_walk_reports_base_command() {
    let dir = tempdir().unwrap();
    let tool_path = dir.path().join("echo_tool.cwl");
    fs::write(&tool_path, ECHO_TOOL).unwrap();

    Command::cargo_bin("cwl-inspect")
        .unwrap()
        .arg(&tool_path)
        .arg(".baseCommand")
        .assert()
        .success()
        .stdout(predicate::str::contains("echo"));
}

#[test]
fn test_keys_lists_input_ids() {
    let dir = tempdir().unwrap();
    let tool_path = dir.path().join("echo_tool.cwl");
    fs::write(&tool_path, ECHO_TOOL).unwrap();

    Command::cargo_bin("cwl-inspect")
        .unwrap()
        .arg(&tool_path)
        .arg("keys(.inputs)")
        .assert()
        .success()
        .stdout(predicate::str::contains("message"))
        .stdout(predicate::str::contains("verbose"));
}

#[test]
fn test_list_predicts_tool_output_filename() {
    let dir = tempdir().unwrap();
    let tool_path = dir.path().join("echo_tool.cwl");
    fs::write(&tool_path, ECHO_TOOL).unwrap();

    Command::cargo_bin("cwl-inspect")
        .unwrap()
        .arg(&tool_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("outputs.out"))
        .stdout(predicate::str::contains("out.txt"));
}

#[test]
fn test_list_reports_workflow_output_forwarding() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("echo_tool.cwl"), ECHO_TOOL).unwrap();
    let wf_path = dir.path().join("scatter.cwl");
    fs::write(&wf_path, SCATTER_WORKFLOW).unwrap();

    Command::cargo_bin("cwl-inspect")
        .unwrap()
        .arg(&wf_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("outputs.result"))
        .stdout(predicate::str::contains("say/out"));
}

#[test]
fn test_commandline_renders_argv_with_job_file() {
    let dir = tempdir().unwrap();
    let tool_path = dir.path().join("echo_tool.cwl");
    fs::write(&tool_path, ECHO_TOOL).unwrap();
    let job_path = dir.path().join("job.yml");
    fs::write(&job_path, "message: hello\nverbose: true\n").unwrap();

    Command::cargo_bin("cwl-inspect")
        .unwrap()
        .arg(&tool_path)
        .arg("commandline")
        .arg("-i")
        .arg(&job_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"))
        .stdout(predicate::str::contains("--verbose"));
}

const SUM_EXPRESSION_TOOL: &str = r#"#!/usr/bin/env cwl-runner

cwlVersion: v1.0
class: ExpressionTool

requirements:
  - class: InlineJavascriptRequirement

inputs:
  first:
    type: int
  second:
    type: int

outputs:
  sum:
    type: int

expression: "${return {'sum': inputs.first + inputs.second};}"
"#;

#[test]
fn test_commandline_renders_expression_tool_as_echo_shell_line() {
    let dir = tempdir().unwrap();
    let tool_path = dir.path().join("sum.cwl");
    fs::write(&tool_path, SUM_EXPRESSION_TOOL).unwrap();
    let job_path = dir.path().join("job.yml");
    fs::write(&job_path, "first: 2\nsecond: 3\n").unwrap();

    Command::cargo_bin("cwl-inspect")
        .unwrap()
        .arg(&tool_path)
        .arg("commandline")
        .arg("-i")
        .arg(&job_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("echo"))
        .stdout(predicate::str::contains("cwl.output.json"))
        .stdout(predicate::str::contains("sum"))
        .stdout(predicate::str::contains("5"));
}

#[test]
fn test_walk_reads_document_from_stdin() {
    Command::cargo_bin("cwl-inspect")
        .unwrap()
        .arg("-")
        .arg(".baseCommand")
        .write_stdin(ECHO_TOOL)
        .assert()
        .success()
        .stdout(predicate::str::contains("echo"));
}

#[test]
fn test_unrecognized_query_exits_nonzero() {
    let dir = tempdir().unwrap();
    let tool_path = dir.path().join("echo_tool.cwl");
    fs::write(&tool_path, ECHO_TOOL).unwrap();

    Command::cargo_bin("cwl-inspect").unwrap().arg(&tool_path).arg("nonsense").assert().failure();
}
