//! Test: only push and pull_request events targeting main start a run

use super::PYTHON_PACKAGE;
use crate::helpers::*;
use ci_runner::core::Event;
use std::sync::Arc;

async fn triggered(event: Event) -> (bool, Arc<ScriptedRunner>) {
    let project = project_dir(false);
    let runner = Arc::new(healthy_project(ScriptedRunner::new()));
    let result = run_workflow(PYTHON_PACKAGE, event, runner.clone(), project.path()).await;
    (result.is_some(), runner)
}

#[tokio::test]
async fn test_push_and_pull_request_to_main_trigger() {
    assert!(triggered(Event::new("push", "main")).await.0);
    assert!(triggered(Event::new("pull_request", "main")).await.0);
}

#[tokio::test]
async fn test_full_ref_is_normalised() {
    assert!(triggered(Event::new("push", "refs/heads/main")).await.0);
}

#[tokio::test]
async fn test_other_branches_do_not_trigger() {
    let (ran, runner) = triggered(Event::new("push", "feature/login")).await;
    assert!(!ran);
    assert!(runner.scripts().is_empty());

    assert!(!triggered(Event::new("pull_request", "develop")).await.0);
}

#[tokio::test]
async fn test_other_events_do_not_trigger() {
    let (ran, runner) = triggered(Event::new("schedule", "main")).await;
    assert!(!ran);
    assert!(runner.scripts().is_empty());
}

#[tokio::test]
async fn test_branch_globs() {
    let yaml = r#"
name: Release
on:
  push:
    branches: ["release/*", "hotfix/**"]
steps:
  - id: hello
    run: echo release
"#;
    let project = project_dir(false);
    let runner = Arc::new(ScriptedRunner::new());

    for (branch, expected) in [
        ("release/1.2", true),
        ("release/1.2/rc", false),
        ("hotfix/a/b", true),
        ("main", false),
    ] {
        let result = run_workflow(yaml, Event::new("push", branch), runner.clone(), project.path()).await;
        assert_eq!(result.is_some(), expected, "branch {}", branch);
    }
}
