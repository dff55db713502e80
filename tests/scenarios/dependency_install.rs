//! Test: optional manifests are skipped, installer failures fail the run

use super::PYTHON_PACKAGE;
use crate::helpers::*;
use ci_runner::core::{CommandOutcome, Event, StepState};
use std::sync::Arc;

#[tokio::test]
async fn test_missing_requirements_file_is_skipped() {
    let project = project_dir(false);
    let runner = Arc::new(healthy_project(ScriptedRunner::new()));

    let result = run_workflow(PYTHON_PACKAGE, Event::new("push", "main"), runner.clone(), project.path())
        .await
        .unwrap();

    assert_run_succeeded(&result);
    assert!(!runner.ran("-r requirements.txt"));

    let StepState::Completed { report, .. } = result.step_state("install") else {
        panic!("install should complete");
    };
    assert_eq!(report.skipped_commands(), 1);
    assert!(report.commands.iter().any(|c| matches!(
        &c.outcome,
        CommandOutcome::Skipped { reason } if reason == "requirements.txt not found"
    )));
}

#[tokio::test]
async fn test_present_requirements_file_is_installed() {
    let project = project_dir(true);
    let runner = Arc::new(healthy_project(ScriptedRunner::new()));

    run_workflow(PYTHON_PACKAGE, Event::new("push", "main"), runner.clone(), project.path())
        .await
        .unwrap();

    assert!(runner.ran_script("pip install -r requirements.txt"));
}

#[tokio::test]
async fn test_missing_manifest_is_skipped() {
    let project = project_dir(true);
    std::fs::remove_file(project.path().join("environment.yml")).unwrap();
    let runner = Arc::new(healthy_project(ScriptedRunner::new()));

    let result = run_workflow(PYTHON_PACKAGE, Event::new("push", "main"), runner.clone(), project.path())
        .await
        .unwrap();

    assert_run_succeeded(&result);
    assert!(!runner.ran("conda env update"));
}

#[tokio::test]
async fn test_installer_failure_fails_the_run() {
    let project = project_dir(true);
    let runner = Arc::new(healthy_project(
        ScriptedRunner::new().on("pip install flake8 pytest", 1, ""),
    ));

    let result = run_workflow(PYTHON_PACKAGE, Event::new("push", "main"), runner.clone(), project.path())
        .await
        .unwrap();

    assert_run_failed(&result);
    assert_step_failed(&result, "install", "exited with code 1");
    assert!(!runner.ran_script("pip install -r requirements.txt"));
    assert_step_skipped(&result, "lint-errors");
    assert_step_skipped(&result, "test");
    assert_step_completed(&result, "debug");
}

#[tokio::test]
async fn test_project_install_can_be_disabled() {
    let yaml = r#"
name: Deps
on: [push]
steps:
  - id: install
    uses: install-dependencies
    with:
      package_manager: mamba
      installer: pip3
      install_project: false
"#;
    let project = project_dir(false);
    let runner = Arc::new(ScriptedRunner::new());

    run_workflow(yaml, Event::new("push", "main"), runner.clone(), project.path())
        .await
        .unwrap();

    assert_eq!(
        runner.scripts(),
        vec!["mamba env update --file environment.yml --name base"]
    );
}
