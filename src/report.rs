//! JSON run report

use crate::core::{
    CommandRecord, Event, ExecutionStatus, Step, StepState, TestSummary, WorkflowRun,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Summary of a workflow run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,

    pub workflow_name: String,

    /// Event that triggered the run
    pub event: Event,

    pub status: ExecutionStatus,

    pub started_at: Option<DateTime<Utc>>,

    pub completed_at: Option<DateTime<Utc>>,

    /// Progress (0.0 to 1.0)
    pub progress: f64,

    pub total_steps: usize,
    pub completed_steps: usize,
    pub failed_steps: usize,
    pub skipped_steps: usize,

    pub steps: Vec<StepSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

/// Outcome of one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSummary {
    pub id: String,
    pub name: String,

    /// Action name, `run` for scripts
    pub action: String,

    pub status: StepStatus,

    /// Why the step was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Failure did not fail the run
    pub continue_on_error: bool,

    pub commands: Vec<CommandRecord>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub findings: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<TestSummary>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl RunSummary {
    /// Look up a step by ID
    pub fn step(&self, id: &str) -> Option<&StepSummary> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Write the summary as pretty JSON
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))
    }
}

fn summarize_step(step: &Step) -> StepSummary {
    let (status, reason, error) = match &step.state {
        StepState::Pending => (StepStatus::Pending, None, None),
        StepState::Running { .. } => (StepStatus::Running, None, None),
        StepState::Completed { .. } => (StepStatus::Completed, None, None),
        StepState::Failed { error, .. } => (StepStatus::Failed, None, Some(error.clone())),
        StepState::Skipped { reason } => (StepStatus::Skipped, Some(reason.clone()), None),
    };

    let report = step.state.report().cloned().unwrap_or_default();

    StepSummary {
        id: step.id.clone(),
        name: step.name.clone(),
        action: step.action.kind().to_string(),
        status,
        reason,
        error,
        continue_on_error: step.continue_on_error,
        commands: report.commands,
        findings: report.findings,
        tests: report.tests,
        notes: report.notes,
    }
}

/// Create a summary from a workflow run
pub fn create_summary(run: &WorkflowRun) -> RunSummary {
    RunSummary {
        run_id: run.state.run_id,
        workflow_name: run.workflow_name.clone(),
        event: run.state.event.clone(),
        status: run.state.status,
        started_at: run.state.started_at,
        completed_at: run.state.completed_at,
        progress: run.state.progress(),
        total_steps: run.state.total_steps,
        completed_steps: run.state.completed_steps,
        failed_steps: run.state.failed_steps,
        skipped_steps: run.state.skipped_steps,
        steps: run.steps.iter().map(summarize_step).collect(),
    }
}
