//! Step run conditions (the `if:` field)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// When a step is allowed to run, relative to the outcome of the run so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunCondition {
    /// Only while no earlier step has failed
    Success,
    /// Only once an earlier step has failed
    Failure,
    /// Regardless of earlier outcomes
    Always,
}

impl RunCondition {
    /// Evaluate the condition against the run status at this point
    pub fn should_run(&self, run_failed: bool) -> bool {
        match self {
            RunCondition::Success => !run_failed,
            RunCondition::Failure => run_failed,
            RunCondition::Always => true,
        }
    }
}

impl Default for RunCondition {
    fn default() -> Self {
        RunCondition::Success
    }
}

impl FromStr for RunCondition {
    type Err = String;

    /// Accepts `success()`, `failure()`, `always()`, optionally wrapped in `${{ }}`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix("${{")
            .and_then(|rest| rest.strip_suffix("}}"))
            .unwrap_or(trimmed)
            .trim();

        match inner {
            "success()" => Ok(RunCondition::Success),
            "failure()" => Ok(RunCondition::Failure),
            "always()" => Ok(RunCondition::Always),
            other => Err(format!(
                "unsupported condition '{}' (expected success(), failure() or always())",
                other
            )),
        }
    }
}

impl fmt::Display for RunCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunCondition::Success => write!(f, "success()"),
            RunCondition::Failure => write!(f, "failure()"),
            RunCondition::Always => write!(f, "always()"),
        }
    }
}
