//! Workflow and workflow run domain models

use crate::core::{
    config::WorkflowConfig,
    context::RunEnvironment,
    state::{RunState, StepState},
    step::{Step, StepDefaults},
    trigger::{Event, Triggers},
};
use crate::shell::Shell;
use anyhow::Result;
use std::collections::HashMap;

/// A validated workflow definition
#[derive(Debug, Clone)]
pub struct Workflow {
    /// Workflow name
    pub name: String,

    /// Events that start a run
    pub triggers: Triggers,

    /// Environment exported to every command
    pub env: HashMap<String, String>,

    /// Variables for `{{ name }}` substitution
    pub variables: HashMap<String, String>,

    /// Shell every command runs under
    pub shell: Shell,

    /// Steps in declaration order
    pub steps: Vec<Step>,
}

impl Workflow {
    /// Create a workflow from configuration
    pub fn from_config(config: &WorkflowConfig) -> Result<Self> {
        let defaults = StepDefaults {
            timeout_secs: config.defaults.timeout_secs,
        };

        let steps = config
            .steps
            .iter()
            .map(|step_config| Step::from_config(step_config, &defaults))
            .collect::<Result<Vec<_>>>()?;

        Ok(Workflow {
            name: config.name.clone(),
            triggers: config.triggers.to_triggers()?,
            env: config.env.clone(),
            variables: config.variables.clone(),
            shell: config.defaults.shell,
            steps,
        })
    }

    /// Whether `event` starts a run of this workflow
    pub fn is_triggered_by(&self, event: &Event) -> bool {
        self.triggers.matches(event)
    }

    /// Create the run for `event`, or `None` when the event does not trigger it
    pub fn start_run(&self, event: Event) -> Option<WorkflowRun> {
        if !self.is_triggered_by(&event) {
            return None;
        }

        Some(WorkflowRun {
            workflow_name: self.name.clone(),
            env: self.env.clone(),
            variables: self.variables.clone(),
            shell: self.shell,
            steps: self.steps.clone(),
            state: RunState::new(event),
        })
    }

    /// Template variables a run would start with, `overrides` applied last
    pub fn plan_variables(&self, overrides: &[(String, String)]) -> HashMap<String, String> {
        let mut env = RunEnvironment::new(".");
        for (key, value) in &self.env {
            env.set_variable(key.clone(), value.clone());
        }

        let mut variables = self.variables.clone();
        variables.extend(overrides.iter().cloned());
        env.rendering_variables(&variables)
    }
}

/// One execution of a workflow for a single triggering event
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    pub workflow_name: String,

    pub env: HashMap<String, String>,

    pub variables: HashMap<String, String>,

    pub shell: Shell,

    /// Steps with their runtime state, in execution order
    pub steps: Vec<Step>,

    /// Run-level state
    pub state: RunState,
}

impl WorkflowRun {
    /// Get a step by ID
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Get a mutable step by ID
    pub fn step_mut(&mut self, id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    /// Check if every step reached a terminal state
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.state.is_terminal())
    }

    /// Whether a step has failed in a way that fails the run
    pub fn has_failed(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.state, StepState::Failed { .. }) && !s.continue_on_error)
    }

    /// IDs of steps that actually ran, in order
    pub fn executed_steps(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| matches!(s.state, StepState::Completed { .. } | StepState::Failed { .. }))
            .map(|s| s.id.as_str())
            .collect()
    }

    /// Recount step states into the run state
    pub fn update_counts(&mut self) {
        let mut completed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        for step in &self.steps {
            match &step.state {
                StepState::Completed { .. } => completed += 1,
                StepState::Failed { .. } => failed += 1,
                StepState::Skipped { .. } => skipped += 1,
                _ => {}
            }
        }

        self.state.total_steps = self.steps.len();
        self.state.completed_steps = completed;
        self.state.failed_steps = failed;
        self.state.skipped_steps = skipped;
    }
}
