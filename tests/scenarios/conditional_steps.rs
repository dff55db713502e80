//! Test: run conditions, continue-on-error and environment propagation

use crate::helpers::*;
use ci_runner::core::{Event, StepState};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::test]
async fn test_continue_on_error_does_not_fail_the_run() {
    let yaml = r#"
name: Tolerant
on: [push]
steps:
  - id: flaky
    run: ./scripts/upload-coverage.sh
    continue-on-error: true
  - id: build
    run: make build
  - id: debug
    uses: debug-session
"#;
    let project = project_dir(false);
    let runner = Arc::new(ScriptedRunner::new().on("./scripts/upload-coverage.sh", 1, ""));

    let result = run_workflow(yaml, Event::new("push", "main"), runner.clone(), project.path())
        .await
        .unwrap();

    assert_run_succeeded(&result);
    assert_step_failed(&result, "flaky", "code 1");
    assert_step_completed(&result, "build");
    assert_step_skipped(&result, "debug");
    assert_eq!(result.run.state.failed_steps, 1);
}

#[tokio::test]
async fn test_always_steps_run_after_failure() {
    let yaml = r#"
name: Cleanup
on: [push]
steps:
  - id: build
    run: make build
  - id: package
    run: make dist
  - id: cleanup
    run: make clean
    if: ${{ always() }}
"#;
    let project = project_dir(false);
    let runner = Arc::new(ScriptedRunner::new().on("make build", 2, ""));

    let result = run_workflow(yaml, Event::new("push", "main"), runner.clone(), project.path())
        .await
        .unwrap();

    assert_run_failed(&result);
    assert_execution_order(&result, &["build", "cleanup"]);
    match result.step_state("package") {
        StepState::Skipped { reason } => assert!(reason.contains("success()")),
        other => panic!("package should be skipped, was {:?}", other),
    }
}

#[tokio::test]
async fn test_runtime_bin_dir_is_on_path_for_later_steps() {
    let project = project_dir(false);
    let yaml = r#"
name: Path
on: [push]
steps:
  - id: setup
    uses: setup-runtime
    with:
      version: "3.10"
      root: conda
  - id: which
    run: which python
"#;
    let runner = Arc::new(ScriptedRunner::new().on("python --version", 0, "Python 3.10.12\n"));

    let result = run_workflow(yaml, Event::new("push", "main"), runner.clone(), project.path())
        .await
        .unwrap();

    assert_run_succeeded(&result);
    let bin = project.path().join("conda").join("bin");
    for script in ["python --version", "which python"] {
        let invocation = runner.invocation(script).unwrap();
        let first = std::env::split_paths(&invocation.env["PATH"]).next();
        assert_eq!(first, Some(bin.clone()), "PATH of '{}'", script);
    }
}

#[tokio::test]
async fn test_runtime_root_from_workflow_env() {
    let project = project_dir(false);
    let root = project.path().join("conda");
    let yaml = format!(
        r#"
name: Root from env
on: [push]
env:
  CONDA: "{}"
steps:
  - id: setup
    uses: setup-runtime
    with:
      version: "3.10"
"#,
        root.display()
    );
    let runner = Arc::new(ScriptedRunner::new().on("python --version", 0, "Python 3.10.4\n"));

    let result = run_workflow(&yaml, Event::new("push", "main"), runner, project.path())
        .await
        .unwrap();

    assert_run_succeeded(&result);
    let StepState::Completed { report, .. } = result.step_state("setup") else {
        panic!("setup should complete");
    };
    assert!(report.notes.iter().any(|n| n == "python 3.10.4"));
}

#[tokio::test]
async fn test_runtime_version_mismatch_fails() {
    let project = project_dir(false);
    let yaml = r#"
name: Mismatch
on: [push]
steps:
  - id: setup
    uses: setup-runtime
    with:
      version: "3.10"
      root: conda
  - id: debug
    uses: debug-session
"#;
    let runner = Arc::new(ScriptedRunner::new().on("python --version", 0, "Python 3.9.18\n"));

    let result = run_workflow(yaml, Event::new("push", "main"), runner.clone(), project.path())
        .await
        .unwrap();

    assert_run_failed(&result);
    assert_step_failed(&result, "setup", "requested python 3.10 but found 3.9.18");
    assert_step_completed(&result, "debug");
}

#[tokio::test]
async fn test_missing_runtime_root_fails_without_running_commands() {
    let project = project_dir(false);
    let yaml = r#"
name: No root
on: [push]
steps:
  - id: setup
    uses: setup-runtime
    with:
      version: "3.10"
      root: missing-root
"#;
    let runner = Arc::new(ScriptedRunner::new());

    let result = run_workflow(yaml, Event::new("push", "main"), runner.clone(), project.path())
        .await
        .unwrap();

    assert_run_failed(&result);
    assert_step_failed(&result, "setup", "does not exist");
    assert!(runner.scripts().is_empty());
}

#[tokio::test]
async fn test_variables_and_step_env() {
    let yaml = r#"
name: Vars
on: [push]
env:
  PYTHONHASHSEED: "0"
variables:
  target: src
steps:
  - id: count
    run: "wc -l {{ target }}/*.py"
    env:
      LC_ALL: C
"#;
    let project = project_dir(false);
    let runner = Arc::new(ScriptedRunner::new());

    run_workflow(yaml, Event::new("push", "main"), runner.clone(), project.path())
        .await
        .unwrap();

    let invocation = runner.invocation("wc -l").unwrap();
    assert_eq!(invocation.script, "wc -l src/*.py");
    assert_eq!(invocation.env["PYTHONHASHSEED"], "0");
    assert_eq!(invocation.env["LC_ALL"], "C");
    assert_eq!(invocation.env["CI"], "true");
    assert_eq!(invocation.env["RUNNER_EVENT"], "push");
    assert_eq!(invocation.working_dir, PathBuf::from(project.path()));
}

const SHADOWED: &str = r#"
name: Shadowed
on: [push]
env:
  X: a
variables:
  X: b
steps:
  - id: show
    run: "echo {{ X }}"
"#;

#[tokio::test]
async fn test_workflow_variables_win_over_env() {
    let project = project_dir(false);
    let runner = Arc::new(ScriptedRunner::new());

    run_workflow(SHADOWED, Event::new("push", "main"), runner.clone(), project.path())
        .await
        .unwrap();

    assert!(runner.ran_script("echo b"));
    assert_eq!(runner.invocation("echo b").unwrap().env["X"], "a");
}

#[tokio::test]
async fn test_command_line_variables_win_over_everything() {
    let project = project_dir(false);
    let runner = Arc::new(ScriptedRunner::new());

    run_workflow_with_vars(
        SHADOWED,
        Event::new("push", "main"),
        runner.clone(),
        project.path(),
        &[("X", "c")],
    )
    .await
    .unwrap();

    assert_eq!(runner.scripts(), vec!["echo c"]);
}
