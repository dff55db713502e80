//! Test utility functions for ci-runner

#![allow(dead_code)]

use async_trait::async_trait;
use ci_runner::core::config::WorkflowConfig;
use ci_runner::core::{Event, ExecutionStatus, StepState, WorkflowRun};
use ci_runner::execution::ExecutionEngine;
use ci_runner::shell::{CommandOutput, CommandRunner, Invocation, ShellError};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Command runner that answers scripts from a rule list
///
/// The first rule whose pattern starts the script decides the exit code and
/// stdout. Unmatched scripts succeed with no output.
pub struct ScriptedRunner {
    rules: Vec<(String, i32, String)>,
    invocations: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Answer scripts starting with `pattern`
    pub fn on(mut self, pattern: &str, exit_code: i32, stdout: &str) -> Self {
        self.rules
            .push((pattern.to_string(), exit_code, stdout.to_string()));
        self
    }

    /// Scripts run so far, in order
    pub fn scripts(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.script.clone())
            .collect()
    }

    /// The invocation of the first script containing `pattern`
    pub fn invocation(&self, pattern: &str) -> Option<Invocation> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.script.contains(pattern))
            .cloned()
    }

    pub fn ran(&self, pattern: &str) -> bool {
        self.invocation(pattern).is_some()
    }

    /// Whether exactly this script was run
    pub fn ran_script(&self, script: &str) -> bool {
        self.scripts().iter().any(|s| s == script)
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ShellError> {
        self.invocations.lock().unwrap().push(invocation.clone());

        let (exit_code, stdout) = self
            .rules
            .iter()
            .find(|(pattern, _, _)| invocation.script.starts_with(pattern.as_str()))
            .map(|(_, code, stdout)| (*code, stdout.clone()))
            .unwrap_or((0, String::new()));

        Ok(CommandOutput {
            exit_code: Some(exit_code),
            stdout,
            stderr: String::new(),
        })
    }
}

pub const FAIL_FAST_LINT: &str = "flake8 . --count --select";
pub const ADVISORY_LINT: &str = "flake8 . --count --exit-zero";

/// Add the answers of a healthy Python project after `runner`'s own rules
pub fn healthy_project(runner: ScriptedRunner) -> ScriptedRunner {
    runner
        .on("python --version", 0, "Python 3.10.12\n")
        .on(FAIL_FAST_LINT, 0, "0\n")
        .on(ADVISORY_LINT, 0, "0\n")
        .on("pytest", 0, "===== 12 passed in 0.80s =====\n")
}

/// A project checkout with a runtime root at `conda/`
pub fn project_dir(with_requirements: bool) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("conda/bin")).expect("runtime root");
    std::fs::write(dir.path().join("environment.yml"), "name: base\n").expect("manifest");
    if with_requirements {
        std::fs::write(dir.path().join("requirements.txt"), "numpy\n").expect("requirements");
    }
    dir
}

/// Run a workflow for `event`; `None` when the event does not trigger it
pub async fn run_workflow(
    yaml: &str,
    event: Event,
    runner: Arc<ScriptedRunner>,
    workdir: &Path,
) -> Option<WorkflowTestResult> {
    run_workflow_with_vars(yaml, event, runner, workdir, &[]).await
}

/// Like `run_workflow`, with command line variable overrides
pub async fn run_workflow_with_vars(
    yaml: &str,
    event: Event,
    runner: Arc<ScriptedRunner>,
    workdir: &Path,
    overrides: &[(&str, &str)],
) -> Option<WorkflowTestResult> {
    let workflow = WorkflowConfig::from_yaml(yaml)
        .and_then(|config| config.to_workflow())
        .expect("workflow should be valid");
    let mut run = workflow.start_run(event)?;
    for (key, value) in overrides {
        run.variables.insert(key.to_string(), value.to_string());
    }

    let engine = ExecutionEngine::new(runner).with_working_dir(workdir);
    let status = engine.execute(&mut run).await.expect("run should execute");

    Some(WorkflowTestResult { run, status })
}

/// Result of running a workflow
#[derive(Debug, Clone)]
pub struct WorkflowTestResult {
    pub run: WorkflowRun,
    pub status: ExecutionStatus,
}

impl WorkflowTestResult {
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status == ExecutionStatus::Failed
    }

    /// Get the state of a specific step
    pub fn step_state(&self, step_id: &str) -> &StepState {
        &self
            .run
            .step(step_id)
            .unwrap_or_else(|| panic!("Step '{}' not found in result", step_id))
            .state
    }

    /// Steps that ran, in order
    pub fn execution_order(&self) -> Vec<&str> {
        self.run.executed_steps()
    }

    pub fn summary(&self) -> String {
        format!(
            "{:?} - {} completed, {} failed, {} skipped",
            self.status,
            self.run.state.completed_steps,
            self.run.state.failed_steps,
            self.run.state.skipped_steps
        )
    }
}

/// Assert the run succeeded
pub fn assert_run_succeeded(result: &WorkflowTestResult) {
    assert!(
        result.is_success(),
        "Run should have succeeded, but was: {}\n{:#?}",
        result.summary(),
        result.run.steps.iter().map(|s| (&s.id, &s.state)).collect::<Vec<_>>()
    );
}

/// Assert the run failed
pub fn assert_run_failed(result: &WorkflowTestResult) {
    assert!(
        result.is_failed(),
        "Run should have failed, but was: {}",
        result.summary()
    );
}

/// Assert a step completed
pub fn assert_step_completed(result: &WorkflowTestResult, step_id: &str) {
    let state = result.step_state(step_id);
    assert!(
        matches!(state, StepState::Completed { .. }),
        "Step '{}' should be completed, but was in state: {:?}",
        step_id,
        state
    );
}

/// Assert a step failed with a specific message
pub fn assert_step_failed(result: &WorkflowTestResult, step_id: &str, expected_error: &str) {
    match result.step_state(step_id) {
        StepState::Failed { error, .. } => assert!(
            error.contains(expected_error),
            "Step '{}' error:\n{}\n\ndoes not contain:\n{}",
            step_id,
            error,
            expected_error
        ),
        other => panic!("Step '{}' should have failed, but was in state: {:?}", step_id, other),
    }
}

/// Assert a step was skipped
pub fn assert_step_skipped(result: &WorkflowTestResult, step_id: &str) {
    let state = result.step_state(step_id);
    assert!(
        matches!(state, StepState::Skipped { .. }),
        "Step '{}' should be skipped, but was in state: {:?}",
        step_id,
        state
    );
}

/// Assert exactly these steps ran, in this order
pub fn assert_execution_order(result: &WorkflowTestResult, expected_order: &[&str]) {
    let actual_order = result.execution_order();
    assert_eq!(
        actual_order, expected_order,
        "Expected execution order: {:?}\nActual: {:?}",
        expected_order, actual_order
    );
}
