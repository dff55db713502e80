//! Workflow configuration from YAML

use crate::actions::StepAction;
use crate::core::condition::RunCondition;
use crate::core::trigger::{BranchFilter, EventKind, Triggers};
use crate::core::workflow::Workflow;
use crate::shell::Shell;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Top-level workflow configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Workflow name
    pub name: String,

    /// Events that start a run
    #[serde(rename = "on")]
    pub triggers: TriggerConfig,

    /// Environment variables exported to every command
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Variables available for `{{ name }}` substitution in scripts
    #[serde(default)]
    pub variables: HashMap<String, String>,

    /// Defaults applied to every step
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Workflow steps, in execution order
    pub steps: Vec<StepConfig>,
}

/// `on:` block, either a list of event names or a map of event filters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerConfig {
    /// `on: [push, pull_request]`
    Events(Vec<String>),
    /// `on: { push: { branches: [main] } }`
    Filters(BTreeMap<String, Option<BranchFilterConfig>>),
}

/// Branch restriction of one trigger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchFilterConfig {
    #[serde(default)]
    pub branches: Vec<String>,
}

/// Workflow-wide step defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Shell used for every command
    #[serde(default)]
    pub shell: Shell,

    /// Default per-command timeout in seconds (none = unbounded)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Step configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Unique step identifier
    pub id: String,

    /// Human-readable step name
    #[serde(default)]
    pub name: Option<String>,

    /// Shell script body
    #[serde(default)]
    pub run: Option<String>,

    /// Built-in action name
    #[serde(default)]
    pub uses: Option<String>,

    /// Inputs of the built-in action
    #[serde(default)]
    pub with: Value,

    /// Run condition expression
    #[serde(default, rename = "if")]
    pub condition: Option<String>,

    /// A failure of this step does not fail the run
    #[serde(default, rename = "continue-on-error", alias = "continue_on_error")]
    pub continue_on_error: bool,

    /// Timeout for this step's commands (overrides the default)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Extra environment variables for this step only
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl StepConfig {
    /// Parsed run condition, if one was given
    pub fn parse_condition(&self) -> Result<Option<RunCondition>> {
        self.condition
            .as_deref()
            .map(|expr| {
                expr.parse::<RunCondition>()
                    .map_err(|e| anyhow::anyhow!("Step '{}': {}", self.id, e))
            })
            .transpose()
    }
}

impl TriggerConfig {
    /// Compile into trigger filters
    pub fn to_triggers(&self) -> Result<Triggers> {
        let mut triggers = Triggers::new();

        match self {
            TriggerConfig::Events(events) => {
                for event in events {
                    triggers = triggers.on(EventKind::from(event.as_str()), BranchFilter::any());
                }
            }
            TriggerConfig::Filters(filters) => {
                for (event, filter) in filters {
                    let branches = filter.as_ref().map(|f| f.branches.as_slice()).unwrap_or(&[]);
                    let filter = BranchFilter::new(branches).with_context(|| {
                        format!("Invalid branch pattern for '{}' trigger", event)
                    })?;
                    triggers = triggers.on(EventKind::from(event.as_str()), filter);
                }
            }
        }

        Ok(triggers)
    }
}

impl WorkflowConfig {
    /// Load workflow configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse workflow configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: WorkflowConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the workflow configuration
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            anyhow::bail!("Workflow '{}' has no steps", self.name);
        }

        let triggers = self.triggers.to_triggers()?;
        if triggers.is_empty() {
            anyhow::bail!("Workflow '{}' has no triggers", self.name);
        }

        let mut seen_ids = HashSet::new();
        for step in &self.steps {
            if step.id.trim().is_empty() {
                anyhow::bail!("Step IDs must not be empty");
            }
            if !seen_ids.insert(&step.id) {
                anyhow::bail!("Duplicate step ID: {}", step.id);
            }

            step.parse_condition()?;
            StepAction::from_config(step)?;

            if step.timeout_secs == Some(0) {
                anyhow::bail!("Step '{}' has a zero timeout", step.id);
            }
        }

        Ok(())
    }

    /// Number of defined variables and env entries
    pub fn variable_count(&self) -> usize {
        self.variables.len() + self.env.len()
    }

    /// Convert config to a Workflow domain model
    pub fn to_workflow(&self) -> Result<Workflow> {
        Workflow::from_config(self)
    }
}
