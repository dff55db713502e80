//! Test: the full Python package workflow, passing and failing

use super::PYTHON_PACKAGE;
use crate::helpers::*;
use ci_runner::core::{Event, StepState, TestSummary};
use std::sync::Arc;

/// Everything passes: every step but the debug session runs, in order
#[tokio::test]
async fn test_clean_push_to_main() {
    let project = project_dir(true);
    let runner = Arc::new(healthy_project(ScriptedRunner::new()));

    let result = run_workflow(PYTHON_PACKAGE, Event::new("push", "main"), runner.clone(), project.path())
        .await
        .expect("push to main triggers the workflow");

    assert_run_succeeded(&result);
    assert_execution_order(
        &result,
        &["setup", "install", "lint-errors", "lint-style", "test"],
    );
    assert_step_skipped(&result, "debug");
    assert!(!runner.ran("tmate"));

    assert_eq!(
        runner.scripts(),
        vec![
            "python --version",
            "conda env update --file environment.yml --name base",
            "pip install flake8 pytest",
            "pip install -r requirements.txt",
            "pip install .",
            "flake8 . --count --select=E9,F63,F7,F82 --show-source --statistics",
            "flake8 . --count --exit-zero --max-complexity=10 --max-line-length=127 --statistics",
            "pytest",
        ]
    );

    let StepState::Completed { report, .. } = result.step_state("test") else {
        panic!("test step should be completed");
    };
    assert_eq!(
        report.tests,
        Some(TestSummary {
            passed: 12,
            ..Default::default()
        })
    );
}

/// A failing test fails the run and opens the debug session
#[tokio::test]
async fn test_failing_test_opens_debug_session() {
    let project = project_dir(true);
    let runner = Arc::new(healthy_project(ScriptedRunner::new().on(
        "pytest",
        1,
        "FAILED tests/test_model.py::test_fit\n== 1 failed, 11 passed in 1.02s ==\n",
    )));

    let result = run_workflow(
        PYTHON_PACKAGE,
        Event::new("pull_request", "main"),
        runner.clone(),
        project.path(),
    )
    .await
    .expect("pull request to main triggers the workflow");

    assert_run_failed(&result);
    assert_step_failed(&result, "test", "1 test(s) failed");
    assert_step_completed(&result, "debug");
    assert_eq!(runner.scripts().last().map(String::as_str), Some("tmate -F"));
    assert_execution_order(
        &result,
        &["setup", "install", "lint-errors", "lint-style", "test", "debug"],
    );
}

/// The debug session's own exit status never changes the outcome
#[tokio::test]
async fn test_debug_session_failure_does_not_matter() {
    let project = project_dir(true);
    let runner = Arc::new(healthy_project(
        ScriptedRunner::new()
            .on("pytest", 1, "== 2 failed in 0.10s ==\n")
            .on("tmate", 127, ""),
    ));

    let result = run_workflow(PYTHON_PACKAGE, Event::new("push", "main"), runner, project.path())
        .await
        .unwrap();

    assert_run_failed(&result);
    assert_step_completed(&result, "debug");
    assert_eq!(result.run.state.failed_steps, 1);
}
