//! Built-in step actions
//!
//! Every action compiles into an ordered list of [`CommandSpec`]s. A spec may
//! carry a file guard (skip when the file is absent) and an exit policy
//! (fatal or advisory).

pub mod debug_session;
pub mod install;
pub mod lint;
pub mod script;
pub mod setup_runtime;
pub mod test_suite;

pub use debug_session::DebugSession;
pub use install::InstallDependencies;
pub use lint::{Lint, LintMode};
pub use script::Script;
pub use setup_runtime::SetupRuntime;
pub use test_suite::TestSuite;

use crate::core::condition::RunCondition;
use crate::core::config::StepConfig;
use crate::execution::CommandSession;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// What a non-zero exit of a command means for its step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitPolicy {
    /// Fails the step
    Fatal,
    /// Recorded and reported, never fails the step
    Advisory,
}

/// One command of a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    /// Short description shown in logs and reports
    pub label: String,

    /// Shell script to run
    pub script: String,

    /// Only run when this file exists (relative to the working directory)
    pub guard: Option<PathBuf>,

    pub policy: ExitPolicy,
}

impl CommandSpec {
    pub fn fatal(label: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            script: script.into(),
            guard: None,
            policy: ExitPolicy::Fatal,
        }
    }

    pub fn advisory(label: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            policy: ExitPolicy::Advisory,
            ..Self::fatal(label, script)
        }
    }

    /// Skip this command unless `path` exists
    pub fn guarded_by(mut self, path: impl Into<PathBuf>) -> Self {
        self.guard = Some(path.into());
        self
    }
}

/// Join program and arguments into a shell-safe command line
///
/// Plain words (flags like `--select=E9,F63`) are kept verbatim, anything
/// else is quoted.
pub(crate) fn command_line<I, S>(words: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    words
        .into_iter()
        .enumerate()
        .map(|(index, word)| {
            let word = word.as_ref();
            if is_plain_word(word, index == 0) {
                word.to_string()
            } else {
                shell_words::quote(word).into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The program word must not contain `=`, the shell would read an assignment
fn is_plain_word(word: &str, is_program: bool) -> bool {
    !word.is_empty()
        && word.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '-' | '_' | '/' | ',' | '.' | '+' | ':' | '@')
                || (c == '=' && !is_program)
        })
}

/// The action a step performs
#[derive(Debug, Clone)]
pub enum StepAction {
    /// `run:` shell script
    Script(Script),
    /// `uses: setup-runtime`
    SetupRuntime(SetupRuntime),
    /// `uses: install-dependencies`
    InstallDependencies(InstallDependencies),
    /// `uses: lint`
    Lint(Lint),
    /// `uses: test`
    Test(TestSuite),
    /// `uses: debug-session`
    DebugSession(DebugSession),
}

impl StepAction {
    /// Build the action from a step's `run`/`uses`/`with` fields
    pub fn from_config(step: &StepConfig) -> Result<Self> {
        match (step.run.as_deref(), step.uses.as_deref()) {
            (Some(_), Some(_)) => {
                anyhow::bail!("Step '{}' sets both 'run' and 'uses'", step.id)
            }
            (None, None) => {
                anyhow::bail!("Step '{}' needs either 'run' or 'uses'", step.id)
            }
            (Some(script), None) => Ok(StepAction::Script(Script::new(script))),
            (None, Some(uses)) => {
                let action = match uses {
                    "setup-runtime" => StepAction::SetupRuntime(decode_with(step, uses)?),
                    "install-dependencies" => {
                        StepAction::InstallDependencies(decode_with(step, uses)?)
                    }
                    "lint" => StepAction::Lint(decode_with(step, uses)?),
                    "test" => StepAction::Test(decode_with(step, uses)?),
                    "debug-session" => StepAction::DebugSession(decode_with(step, uses)?),
                    other => anyhow::bail!("Step '{}' uses unknown action '{}'", step.id, other),
                };
                Ok(action)
            }
        }
    }

    /// Name of the action as written in `uses:`
    pub fn kind(&self) -> &'static str {
        match self {
            StepAction::Script(_) => "run",
            StepAction::SetupRuntime(_) => "setup-runtime",
            StepAction::InstallDependencies(_) => "install-dependencies",
            StepAction::Lint(_) => "lint",
            StepAction::Test(_) => "test",
            StepAction::DebugSession(_) => "debug-session",
        }
    }

    /// Condition used when the step has no `if:`
    pub fn default_condition(&self) -> RunCondition {
        match self {
            StepAction::DebugSession(_) => RunCondition::Failure,
            _ => RunCondition::Success,
        }
    }

    /// The commands this action runs, in order
    pub fn plan(&self, variables: &HashMap<String, String>) -> Vec<CommandSpec> {
        match self {
            StepAction::Script(a) => a.plan(variables),
            StepAction::SetupRuntime(a) => a.plan(),
            StepAction::InstallDependencies(a) => a.plan(),
            StepAction::Lint(a) => a.plan(),
            StepAction::Test(a) => a.plan(),
            StepAction::DebugSession(a) => a.plan(),
        }
    }

    /// Run the action; `Err` carries the reason the step failed
    pub async fn run(
        &self,
        session: &mut CommandSession<'_>,
        variables: &HashMap<String, String>,
    ) -> Result<(), String> {
        match self {
            StepAction::Script(a) => a.run(session, variables).await,
            StepAction::SetupRuntime(a) => a.run(session).await,
            StepAction::InstallDependencies(a) => a.run(session).await,
            StepAction::Lint(a) => a.run(session).await,
            StepAction::Test(a) => a.run(session).await,
            StepAction::DebugSession(a) => a.run(session).await,
        }
    }
}

fn decode_with<T: DeserializeOwned>(step: &StepConfig, uses: &str) -> Result<T> {
    let with = match &step.with {
        Value::Null => Value::Mapping(Default::default()),
        other => other.clone(),
    };

    serde_yaml::from_value(with)
        .with_context(|| format!("Step '{}': invalid 'with' for action '{}'", step.id, uses))
}
