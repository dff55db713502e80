//! Test: fail-fast lint gates the run, advisory lint never does

use super::PYTHON_PACKAGE;
use crate::helpers::*;
use ci_runner::core::{Event, StepState};
use std::sync::Arc;

#[tokio::test]
async fn test_advisory_findings_do_not_fail_the_run() {
    let project = project_dir(true);
    let runner = Arc::new(healthy_project(ScriptedRunner::new().on(
        ADVISORY_LINT,
        0,
        "./pkg/model.py:88:80: E501 line too long (131 > 127 characters)\n57\n",
    )));

    let result = run_workflow(PYTHON_PACKAGE, Event::new("push", "main"), runner, project.path())
        .await
        .unwrap();

    assert_run_succeeded(&result);
    let StepState::Completed { report, .. } = result.step_state("lint-style") else {
        panic!("advisory lint should complete");
    };
    assert_eq!(report.findings, Some(57));
    assert!(report.notes.iter().any(|n| n == "57 advisory finding(s)"));
    assert_step_skipped(&result, "debug");
}

#[tokio::test]
async fn test_advisory_lint_ignores_non_zero_exit() {
    let project = project_dir(true);
    let runner = Arc::new(healthy_project(ScriptedRunner::new().on(ADVISORY_LINT, 2, "")));

    let result = run_workflow(PYTHON_PACKAGE, Event::new("push", "main"), runner, project.path())
        .await
        .unwrap();

    assert_run_succeeded(&result);
    assert_step_completed(&result, "lint-style");
}

#[tokio::test]
async fn test_fail_fast_findings_stop_the_run() {
    let project = project_dir(true);
    let runner = Arc::new(healthy_project(ScriptedRunner::new().on(
        FAIL_FAST_LINT,
        1,
        "./pkg/model.py:3:1: F821 undefined name 'np'\n1     F821 undefined name 'np'\n1\n",
    )));

    let result = run_workflow(PYTHON_PACKAGE, Event::new("push", "main"), runner.clone(), project.path())
        .await
        .unwrap();

    assert_run_failed(&result);
    assert_step_failed(&result, "lint-errors", "1 severe diagnostic(s) found");
    assert_step_skipped(&result, "lint-style");
    assert_step_skipped(&result, "test");
    assert_step_completed(&result, "debug");
    assert!(!runner.ran_script("pytest"));
}

#[tokio::test]
async fn test_fail_fast_without_findings_passes() {
    let project = project_dir(true);
    let runner = Arc::new(healthy_project(ScriptedRunner::new()));

    let result = run_workflow(PYTHON_PACKAGE, Event::new("push", "main"), runner, project.path())
        .await
        .unwrap();

    let StepState::Completed { report, .. } = result.step_state("lint-errors") else {
        panic!("fail-fast lint should complete");
    };
    assert_eq!(report.findings, Some(0));
}

#[tokio::test]
async fn test_custom_lint_settings() {
    let yaml = r#"
name: Lint only
on: [push]
steps:
  - id: style
    uses: lint
    with:
      mode: advisory
      target: src
      ignore: [E203, W503]
      max_line_length: 88
"#;
    let project = project_dir(false);
    let runner = Arc::new(ScriptedRunner::new());

    let result = run_workflow(yaml, Event::new("push", "main"), runner.clone(), project.path())
        .await
        .unwrap();

    assert_run_succeeded(&result);
    assert_eq!(
        runner.scripts(),
        vec!["flake8 src --count --exit-zero --max-complexity=10 --max-line-length=88 --extend-ignore=E203,W503 --statistics"]
    );
}
