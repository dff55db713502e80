//! Execution state models

use crate::core::trigger::Event;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Overall workflow run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Run has not started
    Pending,
    /// Run is currently executing steps
    Running,
    /// Every non-tolerated step succeeded
    Completed,
    /// At least one non-tolerated step failed
    Failed,
}

/// How a single command inside a step ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum CommandOutcome {
    /// Exited zero
    Succeeded,
    /// Guard not met, command never started
    Skipped { reason: String },
    /// Non-zero exit of a fatal command, or the command could not run
    Failed { exit_code: Option<i32> },
    /// Non-zero exit of an advisory command
    Advisory { exit_code: Option<i32> },
}

/// Record of one command executed (or skipped) by a step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRecord {
    pub label: String,
    pub outcome: CommandOutcome,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

/// Result of a `pytest`-style test session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Everything a step produced, kept regardless of success or failure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepReport {
    /// Per-command records in execution order
    pub commands: Vec<CommandRecord>,

    /// Combined stdout of all commands that ran
    pub output: String,

    /// Number of diagnostics reported by a lint pass
    pub findings: Option<usize>,

    /// Parsed test session summary
    pub tests: Option<TestSummary>,

    /// Free-form notes (e.g. the resolved runtime path)
    pub notes: Vec<String>,
}

impl StepReport {
    /// Number of commands skipped because their guard was not met
    pub fn skipped_commands(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c.outcome, CommandOutcome::Skipped { .. }))
            .count()
    }
}

/// State of a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StepState {
    /// Step has not been reached yet
    Pending,
    /// Step is currently running
    Running { started_at: DateTime<Utc> },
    /// Step completed successfully
    Completed {
        report: StepReport,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// Step failed
    Failed {
        error: String,
        report: StepReport,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
    /// Step's run condition was false
    Skipped { reason: String },
}

impl StepState {
    /// Check if step is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepState::Completed { .. } | StepState::Failed { .. } | StepState::Skipped { .. }
        )
    }

    /// The report of a step that ran, if any
    pub fn report(&self) -> Option<&StepReport> {
        match self {
            StepState::Completed { report, .. } | StepState::Failed { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// State of one workflow run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Unique run ID
    pub run_id: Uuid,

    /// The event that triggered this run
    pub event: Event,

    /// Current status
    pub status: ExecutionStatus,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution finished
    pub completed_at: Option<DateTime<Utc>>,

    pub total_steps: usize,
    pub completed_steps: usize,
    pub failed_steps: usize,
    pub skipped_steps: usize,
}

impl RunState {
    /// Create a new run state for an event
    pub fn new(event: Event) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            event,
            status: ExecutionStatus::Pending,
            started_at: None,
            completed_at: None,
            total_steps: 0,
            completed_steps: 0,
            failed_steps: 0,
            skipped_steps: 0,
        }
    }

    /// Mark run as started
    pub fn start(&mut self, total_steps: usize) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
        self.total_steps = total_steps;
    }

    /// Mark run as completed
    pub fn complete(&mut self) {
        self.status = ExecutionStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark run as failed
    pub fn fail(&mut self) {
        self.status = ExecutionStatus::Failed;
        self.completed_at = Some(Utc::now());
    }

    /// Progress through the step list (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        (self.completed_steps + self.failed_steps + self.skipped_steps) as f64
            / self.total_steps as f64
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
