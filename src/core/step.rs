//! Step domain model

use crate::actions::{CommandSpec, StepAction};
use crate::core::{condition::RunCondition, config::StepConfig, state::StepState};
use anyhow::Result;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::time::Duration;

/// A single step in a workflow
#[derive(Debug, Clone)]
pub struct Step {
    /// Unique step identifier
    pub id: String,

    /// Display name (falls back to the id)
    pub name: String,

    /// What the step does
    pub action: StepAction,

    /// When the step is allowed to run
    pub condition: RunCondition,

    /// A failure of this step does not fail the run
    pub continue_on_error: bool,

    /// Per-command timeout
    pub timeout: Option<Duration>,

    /// Extra environment for this step's commands
    pub env: HashMap<String, String>,

    /// Runtime state
    pub state: StepState,
}

/// Values a step inherits from the workflow
#[derive(Debug, Clone, Default)]
pub struct StepDefaults {
    pub timeout_secs: Option<u64>,
}

impl Step {
    /// Create a step from a step config
    pub fn from_config(config: &StepConfig, defaults: &StepDefaults) -> Result<Self> {
        let action = StepAction::from_config(config)?;
        let condition = config
            .parse_condition()?
            .unwrap_or_else(|| action.default_condition());

        Ok(Step {
            id: config.id.clone(),
            name: config.name.clone().unwrap_or_else(|| config.id.clone()),
            action,
            condition,
            continue_on_error: config.continue_on_error,
            timeout: config
                .timeout_secs
                .or(defaults.timeout_secs)
                .map(Duration::from_secs),
            env: config.env.clone(),
            state: StepState::Pending,
        })
    }

    /// Whether the step runs given the run status at this point
    pub fn should_run(&self, run_failed: bool) -> bool {
        self.condition.should_run(run_failed)
    }

    /// Commands this step will execute, for display and dry runs
    pub fn commands(&self, variables: &HashMap<String, String>) -> Vec<CommandSpec> {
        self.action.plan(variables)
    }
}

/// Replace `{{ name }}` placeholders in one pass
///
/// Substituted values are never expanded again. Unknown names are left as is.
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> String {
    let Ok(placeholder) = Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}") else {
        return template.to_string();
    };

    placeholder
        .replace_all(template, |caps: &Captures| match variables.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
